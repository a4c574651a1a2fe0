//! Users-on-an-IP aggregation query
//!
//! Builds the DSL document answering "which user accounts were active on
//! a given IP within a time window", bucketed by `user.name` with nested
//! id/group sub-aggregations. The aggregation names (`user_count`,
//! `users`, `id`, `groupId`, `groupName`) are a wire contract: downstream
//! result parsers key off these exact names.

use serde_json::{json, Value};
use tracing::debug;

use crate::query::{create_query_filter_clauses, range_clause, term_clause};
use crate::request::{Direction, UsersField, UsersRequestOptions, UsersSortField};

/// Terms-aggregation bucket ordering, either by lexical key or by
/// per-bucket document count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrder {
    Key(Direction),
    Count(Direction),
}

impl QueryOrder {
    fn to_value(self) -> Value {
        match self {
            Self::Key(direction) => json!({ "_key": direction }),
            Self::Count(direction) => json!({ "_count": direction }),
        }
    }
}

/// Resolve the sort specification into a bucket ordering.
///
/// Total over the closed [`UsersField`] enum; a new sortable field will
/// not compile until it is mapped here.
pub fn query_order(sort: &UsersSortField) -> QueryOrder {
    match sort.field {
        UsersField::Name => QueryOrder::Key(sort.direction),
        UsersField::Count => QueryOrder::Count(sort.direction),
    }
}

/// Build the users aggregation query for a single IP.
///
/// The query spans the three configured aliases with `allow_no_indices`
/// and `ignore_unavailable` enabled: a missing or empty alias narrows
/// coverage, it does not fail the query. `user_count` is an approximate
/// distinct count of `user.name`; `users` buckets `limit + 1` names so
/// the caller can detect a further page without a count round-trip.
/// Documents with `event.category == authentication` are always excluded;
/// that rule is part of the query, not a caller option.
///
/// Pure and infallible: identical options yield identical documents.
pub fn build_users_query(options: &UsersRequestOptions) -> Value {
    let mut filter = create_query_filter_clauses(options.filter_query.as_ref());
    filter.push(range_clause(
        &options.source.timestamp_field,
        options.timerange.from,
        options.timerange.to,
    ));
    filter.push(term_clause(
        options.flow_target.ip_field(),
        &options.ip.to_string(),
    ));

    let dsl_query = json!({
        "allow_no_indices": true,
        "index": [
            options.source.auditbeat_alias,
            options.source.packetbeat_alias,
            options.source.winlogbeat_alias,
        ],
        "ignore_unavailable": true,
        "body": {
            "aggs": {
                "user_count": {
                    "cardinality": {
                        "field": "user.name",
                    }
                },
                "users": {
                    "terms": {
                        "field": "user.name",
                        "size": u64::from(options.pagination.limit) + 1,
                        "order": query_order(&options.sort).to_value(),
                    },
                    "aggs": {
                        "id": {
                            "terms": {
                                "field": "user.id",
                            }
                        },
                        "groupId": {
                            "terms": {
                                "field": "user.group.id",
                            }
                        },
                        "groupName": {
                            "terms": {
                                "field": "user.group.name",
                            }
                        },
                    },
                },
            },
            "query": {
                "bool": {
                    "filter": filter,
                    "must_not": [
                        {
                            "term": {
                                "event.category": "authentication",
                            }
                        }
                    ],
                },
            },
            "size": 0,
            "track_total_hits": false,
        },
    });

    debug!(
        ip = %options.ip,
        flow_target = %options.flow_target,
        limit = options.pagination.limit,
        "built users query"
    );

    dsl_query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{FlowTarget, Pagination, SourceConfiguration, TimeRange};
    use chrono::{TimeZone, Utc};

    fn test_options() -> UsersRequestOptions {
        UsersRequestOptions {
            ip: "10.0.0.5".parse().unwrap(),
            sort: UsersSortField {
                field: UsersField::Name,
                direction: Direction::Asc,
            },
            filter_query: None,
            flow_target: FlowTarget::Destination,
            pagination: Pagination { limit: 10 },
            source: SourceConfiguration {
                auditbeat_alias: "auditbeat-*".to_string(),
                packetbeat_alias: "packetbeat-*".to_string(),
                winlogbeat_alias: "winlogbeat-*".to_string(),
                timestamp_field: "@timestamp".to_string(),
            },
            timerange: TimeRange {
                from: Utc.with_ymd_and_hms(2023, 10, 1, 0, 0, 0).unwrap(),
                to: Utc.with_ymd_and_hms(2023, 10, 2, 0, 0, 0).unwrap(),
            },
        }
    }

    fn filter_clauses(query: &Value) -> &Vec<Value> {
        query["body"]["query"]["bool"]["filter"]
            .as_array()
            .unwrap()
    }

    #[test]
    fn test_terms_size_is_limit_plus_one() {
        for limit in [1u32, 10, 50, 9_999] {
            let mut options = test_options();
            options.pagination.limit = limit;
            let query = build_users_query(&options);
            assert_eq!(
                query["body"]["aggs"]["users"]["terms"]["size"],
                json!(limit + 1)
            );
        }
    }

    #[test]
    fn test_filter_always_has_range_and_ip_term() {
        let options = test_options();
        let query = build_users_query(&options);
        let filter = filter_clauses(&query);

        assert_eq!(filter.len(), 2);
        assert_eq!(
            filter[0],
            json!({
                "range": {
                    "@timestamp": {
                        "gte": 1_696_118_400_000_i64,
                        "lte": 1_696_204_800_000_i64,
                    }
                }
            })
        );
        assert_eq!(filter[1], json!({"term": {"destination.ip": "10.0.0.5"}}));
    }

    #[test]
    fn test_filter_query_clause_comes_first() {
        let mut options = test_options();
        options.filter_query = Some(json!({"match": {"user.name": "root"}}));
        let query = build_users_query(&options);
        let filter = filter_clauses(&query);

        assert_eq!(filter.len(), 3);
        assert_eq!(filter[0], json!({"match": {"user.name": "root"}}));
        assert!(filter[1]["range"].is_object());
        assert!(filter[2]["term"].is_object());
    }

    #[test]
    fn test_source_flow_target_uses_source_ip_field() {
        let mut options = test_options();
        options.flow_target = FlowTarget::Source;
        options.ip = "192.168.1.1".parse().unwrap();
        let query = build_users_query(&options);
        let filter = filter_clauses(&query);
        assert_eq!(filter[1], json!({"term": {"source.ip": "192.168.1.1"}}));
    }

    #[test]
    fn test_authentication_events_always_excluded() {
        let mut options = test_options();
        options.filter_query = Some(json!({"match_all": {}}));
        let query = build_users_query(&options);
        assert_eq!(
            query["body"]["query"]["bool"]["must_not"],
            json!([{"term": {"event.category": "authentication"}}])
        );
    }

    #[test]
    fn test_query_targets_all_three_aliases() {
        let query = build_users_query(&test_options());
        assert_eq!(
            query["index"],
            json!(["auditbeat-*", "packetbeat-*", "winlogbeat-*"])
        );
        assert_eq!(query["allow_no_indices"], json!(true));
        assert_eq!(query["ignore_unavailable"], json!(true));
    }

    #[test]
    fn test_no_hits_returned() {
        let query = build_users_query(&test_options());
        assert_eq!(query["body"]["size"], json!(0));
        assert_eq!(query["body"]["track_total_hits"], json!(false));
    }

    #[test]
    fn test_aggregation_names_are_stable() {
        let query = build_users_query(&test_options());
        let aggs = query["body"]["aggs"].as_object().unwrap();
        assert!(aggs.contains_key("user_count"));
        assert_eq!(aggs["user_count"]["cardinality"]["field"], "user.name");

        let sub_aggs = aggs["users"]["aggs"].as_object().unwrap();
        assert_eq!(sub_aggs["id"]["terms"]["field"], "user.id");
        assert_eq!(sub_aggs["groupId"]["terms"]["field"], "user.group.id");
        assert_eq!(sub_aggs["groupName"]["terms"]["field"], "user.group.name");
    }

    #[test]
    fn test_query_order_resolution() {
        let name_asc = UsersSortField {
            field: UsersField::Name,
            direction: Direction::Asc,
        };
        assert_eq!(query_order(&name_asc), QueryOrder::Key(Direction::Asc));
        assert_eq!(query_order(&name_asc).to_value(), json!({"_key": "asc"}));

        let count_desc = UsersSortField {
            field: UsersField::Count,
            direction: Direction::Desc,
        };
        assert_eq!(query_order(&count_desc), QueryOrder::Count(Direction::Desc));
        assert_eq!(
            query_order(&count_desc).to_value(),
            json!({"_count": "desc"})
        );
    }

    #[test]
    fn test_sort_order_applied_to_terms_aggregation() {
        let mut options = test_options();
        options.sort = UsersSortField {
            field: UsersField::Count,
            direction: Direction::Desc,
        };
        let query = build_users_query(&options);
        assert_eq!(
            query["body"]["aggs"]["users"]["terms"]["order"],
            json!({"_count": "desc"})
        );
    }

    #[test]
    fn test_builder_is_deterministic() {
        let options = test_options();
        assert_eq!(build_users_query(&options), build_users_query(&options));
    }
}
