#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Flowquery - an Elasticsearch DSL query builder for per-IP user analytics
//!
//! Flowquery translates typed filter/sort/pagination options into the
//! aggregation query documents a SIEM-style ip-details view issues against
//! beats indices. It can be used as both a command-line application and a
//! library. Query construction is pure: no I/O, no state, no execution —
//! submitting the document to a cluster is the caller's concern.
//!
//! # Architecture
//!
//! - **[`request`]**: typed, validated request options (flow target, sort
//!   specification, time range, pagination, source configuration)
//! - **[`query`]**: pure builders from request options to DSL documents,
//!   plus the generic filter-clause helpers they share
//! - **[`config`]**: configuration management (index aliases, timestamp
//!   field)
//!
//! # Quick Start
//!
//! ```rust
//! use flowquery::query::{build_users_query, parse_filter_query};
//! use flowquery::request::*;
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> anyhow::Result<()> {
//! let options = UsersRequestOptions {
//!     ip: "10.0.0.5".parse()?,
//!     sort: UsersSortField {
//!         field: UsersField::Count,
//!         direction: Direction::Desc,
//!     },
//!     filter_query: parse_filter_query(r#"{"match": {"host.os.family": "linux"}}"#)?,
//!     flow_target: FlowTarget::Destination,
//!     pagination: Pagination { limit: 10 },
//!     source: SourceConfiguration {
//!         auditbeat_alias: "auditbeat-*".to_string(),
//!         packetbeat_alias: "packetbeat-*".to_string(),
//!         winlogbeat_alias: "winlogbeat-*".to_string(),
//!         timestamp_field: "@timestamp".to_string(),
//!     },
//!     timerange: TimeRange {
//!         from: Utc.with_ymd_and_hms(2023, 10, 1, 0, 0, 0).unwrap(),
//!         to: Utc.with_ymd_and_hms(2023, 10, 2, 0, 0, 0).unwrap(),
//!     },
//! };
//! options.validate()?;
//!
//! let query = build_users_query(&options);
//! println!("{}", serde_json::to_string_pretty(&query)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod query;
pub mod request;

// Time parsing helpers for the CLI - feature gated
#[cfg(feature = "cli")]
pub mod time;

pub use config::FlowqueryConfig;

pub use request::{
    Direction, FlowTarget, Pagination, SourceConfiguration, TimeRange, UsersField,
    UsersRequestOptions, UsersSortField, MAX_QUERY_LIMIT,
};

pub use query::{build_users_query, create_query_filter_clauses, parse_filter_query};

#[cfg(feature = "cli")]
pub use time::{resolve_time_range, string_to_time};
