//! Typed request options for query building
//!
//! Everything a query builder consumes is validated once here at the
//! boundary, so the builders themselves stay total and panic-free. The
//! enumerations are closed, which lets the sort-order resolver rely on
//! compiler-checked exhaustive matching instead of a runtime default arm.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Upper bound for the pagination limit, matching the Elasticsearch
/// terms-aggregation bucket ceiling.
pub const MAX_QUERY_LIMIT: u32 = 10_000;

/// Sort direction, rendered as `asc`/`desc` in the DSL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            _ => Err(format!(
                "Unknown sort direction '{}'. Valid directions: asc, desc",
                s
            )),
        }
    }
}

/// Which side of a recorded flow the IP filter applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowTarget {
    Source,
    Destination,
}

impl FlowTarget {
    /// Field name the IP equality filter matches against
    pub fn ip_field(&self) -> &'static str {
        match self {
            Self::Source => "source.ip",
            Self::Destination => "destination.ip",
        }
    }
}

impl fmt::Display for FlowTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Destination => write!(f, "destination"),
        }
    }
}

impl FromStr for FlowTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "source" | "src" => Ok(Self::Source),
            "destination" | "dst" => Ok(Self::Destination),
            _ => Err(format!(
                "Unknown flow target '{}'. Valid targets: source, destination",
                s
            )),
        }
    }
}

/// Sortable fields of the users aggregation
///
/// Closed enumeration: adding a variant forces every match over it to be
/// updated, including the sort-order resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsersField {
    /// Sort buckets by user name (lexical key)
    Name,
    /// Sort buckets by per-user document count
    Count,
}

impl fmt::Display for UsersField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Count => write!(f, "count"),
        }
    }
}

impl FromStr for UsersField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "count" => Ok(Self::Count),
            _ => Err(format!(
                "Unknown sort field '{}'. Valid fields: name, count",
                s
            )),
        }
    }
}

/// Sort specification: a sortable field paired with a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersSortField {
    pub field: UsersField,
    pub direction: Direction,
}

/// Inclusive time window, rendered as epoch milliseconds in the DSL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Pagination input; the builder requests `limit + 1` buckets so the
/// caller can detect a further page without a second count query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u32,
}

/// Index aliases and field names the query is built against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfiguration {
    /// Alias covering auditbeat indices, e.g. `auditbeat-*`
    pub auditbeat_alias: String,
    /// Alias covering packetbeat indices, e.g. `packetbeat-*`
    pub packetbeat_alias: String,
    /// Alias covering winlogbeat indices, e.g. `winlogbeat-*`
    pub winlogbeat_alias: String,
    /// Timestamp field the time-range filter is applied to
    pub timestamp_field: String,
}

/// Full input for the users query builder
///
/// Immutable value object, constructed and validated by the caller. The
/// free-text filter expression, if any, is already parsed into a JSON
/// clause by [`crate::query::parse_filter_query`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsersRequestOptions {
    pub ip: IpAddr,
    pub sort: UsersSortField,
    pub filter_query: Option<Value>,
    pub flow_target: FlowTarget,
    pub pagination: Pagination,
    pub source: SourceConfiguration,
    pub timerange: TimeRange,
}

impl UsersRequestOptions {
    pub fn validate(&self) -> Result<()> {
        if self.pagination.limit == 0 {
            return Err(anyhow!("pagination limit must be at least 1"));
        }
        if self.pagination.limit > MAX_QUERY_LIMIT {
            return Err(anyhow!(
                "pagination limit {} exceeds maximum of {}",
                self.pagination.limit,
                MAX_QUERY_LIMIT
            ));
        }
        if self.timerange.from > self.timerange.to {
            return Err(anyhow!(
                "time range start {} is after end {}",
                self.timerange.from.to_rfc3339(),
                self.timerange.to.to_rfc3339()
            ));
        }
        self.source.validate()
    }
}

impl SourceConfiguration {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("auditbeat_alias", &self.auditbeat_alias),
            ("packetbeat_alias", &self.packetbeat_alias),
            ("winlogbeat_alias", &self.winlogbeat_alias),
            ("timestamp_field", &self.timestamp_field),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("source configuration field {} is empty", name));
            }
        }
        Ok(())
    }
}
