//! Flexible time input for the CLI
//!
//! Accepts unix timestamps, RFC3339 strings, and human-readable dates,
//! and resolves a `--from`/`--to`/`--duration` triple into the inclusive
//! time range the query builders consume.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

use crate::request::TimeRange;

pub fn string_to_time(time_string: &str) -> Result<DateTime<Utc>> {
    let ts = match dateparser::parse_with(
        time_string,
        &Utc,
        chrono::NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(|| anyhow!("Failed to create time"))?,
    ) {
        Ok(ts) => ts,
        Err(_) => {
            return Err(anyhow!(
                "Input time must be either Unix timestamp or time string compliant with RFC3339"
            ))
        }
    };

    Ok(ts)
}

/// Resolve `from`/`to`/`duration` inputs into a time range.
///
/// Exactly two of the three must be given: an explicit from/to pair, or
/// one endpoint plus a duration (e.g. `1h`, `2d`) extending from it.
pub fn resolve_time_range(
    from: &Option<String>,
    to: &Option<String>,
    duration: &Option<String>,
) -> Result<TimeRange> {
    let from_ts = match from {
        Some(ts) => Some(
            string_to_time(ts.as_str())
                .map_err(|_| anyhow!("from is not a valid time string: {}", ts))?,
        ),
        None => None,
    };
    let to_ts = match to {
        Some(ts) => Some(
            string_to_time(ts.as_str())
                .map_err(|_| anyhow!("to is not a valid time string: {}", ts))?,
        ),
        None => None,
    };

    match (from_ts, to_ts, duration) {
        (Some(_), Some(_), Some(_)) => Err(anyhow!(
            "cannot specify from, to, and duration all at the same time"
        )),
        (Some(from), Some(to), None) => Ok(TimeRange { from, to }),
        (Some(from), None, Some(duration)) => {
            let duration = parse_duration(duration)?;
            Ok(TimeRange {
                from,
                to: from + duration,
            })
        }
        (None, Some(to), Some(duration)) => {
            let duration = parse_duration(duration)?;
            Ok(TimeRange {
                from: to - duration,
                to,
            })
        }
        _ => Err(anyhow!("must specify two from: from, to and duration")),
    }
}

fn parse_duration(duration: &str) -> Result<chrono::Duration> {
    let parsed = humantime::parse_duration(duration)
        .map_err(|_| anyhow!("duration is not a valid time duration string: {}", duration))?;
    chrono::Duration::from_std(parsed)
        .map_err(|_| anyhow!("duration is out of range: {}", duration))
}
