//! Elasticsearch DSL query construction
//!
//! Builders here are pure functions from validated request options to
//! JSON query documents. They perform no I/O and raise no errors; all
//! input validation happens at the boundary in [`crate::request`].

pub use users::{build_users_query, query_order, QueryOrder};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

mod users;

/// Parse a caller-supplied free-text filter expression into a query clause.
///
/// Empty or whitespace-only input means "no filter". Anything else must be
/// a JSON object (a single bool/term/match/... clause); invalid JSON or a
/// non-object value is an error rather than a silently dropped filter,
/// since dropped filters on security data produce wrong results.
pub fn parse_filter_query(raw: &str) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| anyhow!("filter query is not valid JSON: {e}"))?;
    if !value.is_object() {
        return Err(anyhow!(
            "filter query must be a JSON object clause, got: {value}"
        ));
    }
    Ok(Some(value))
}

/// Expand an optional filter expression into the leading filter clauses.
pub fn create_query_filter_clauses(filter_query: Option<&Value>) -> Vec<Value> {
    match filter_query {
        Some(clause) => vec![clause.clone()],
        None => vec![],
    }
}

/// Inclusive range clause on a timestamp field, in epoch milliseconds.
pub fn range_clause(field: &str, from: DateTime<Utc>, to: DateTime<Utc>) -> Value {
    json!({
        "range": {
            field: {
                "gte": from.timestamp_millis(),
                "lte": to.timestamp_millis(),
            }
        }
    })
}

/// Exact-match term clause.
pub fn term_clause(field: &str, value: &str) -> Value {
    json!({ "term": { field: value } })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_filter_query_empty_is_none() {
        assert_eq!(parse_filter_query("").unwrap(), None);
        assert_eq!(parse_filter_query("   \n\t").unwrap(), None);
    }

    #[test]
    fn test_parse_filter_query_object() {
        let clause = parse_filter_query(r#"{"match": {"user.name": "root"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(clause, json!({"match": {"user.name": "root"}}));
    }

    #[test]
    fn test_parse_filter_query_rejects_invalid_json() {
        assert!(parse_filter_query("{not json").is_err());
    }

    #[test]
    fn test_parse_filter_query_rejects_non_object() {
        assert!(parse_filter_query("42").is_err());
        assert!(parse_filter_query(r#"["a", "b"]"#).is_err());
        assert!(parse_filter_query(r#""term""#).is_err());
    }

    #[test]
    fn test_create_query_filter_clauses() {
        assert!(create_query_filter_clauses(None).is_empty());

        let clause = json!({"match_all": {}});
        let clauses = create_query_filter_clauses(Some(&clause));
        assert_eq!(clauses, vec![clause]);
    }

    #[test]
    fn test_range_clause_uses_epoch_millis() {
        let from = Utc.with_ymd_and_hms(2023, 10, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2023, 10, 2, 0, 0, 0).unwrap();
        assert_eq!(
            range_clause("@timestamp", from, to),
            json!({
                "range": {
                    "@timestamp": {
                        "gte": 1_696_118_400_000_i64,
                        "lte": 1_696_204_800_000_i64,
                    }
                }
            })
        );
    }

    #[test]
    fn test_term_clause() {
        assert_eq!(
            term_clause("destination.ip", "10.0.0.5"),
            json!({"term": {"destination.ip": "10.0.0.5"}})
        );
    }
}
