//! Watermark resolution for a sync run.
//!
//! The watermark is the modification instant a run filters on: only
//! contacts changed strictly after it are pulled. It comes from `--since`,
//! from `--full-sync` (the epoch), or defaults to one hour before now.

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Parse a `--since` value.
///
/// Accepts RFC 3339 (`2024-06-01T00:00:00Z`, `2024-06-01T02:00:00+02:00`)
/// and naive datetimes, which are taken as UTC.
pub fn parse_since(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("Invalid --since timestamp: {value}"))?;
    Ok(naive.and_utc())
}

/// Resolve the watermark for this run.
pub fn resolve_watermark(
    since: Option<&str>,
    full_sync: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<DateTime<Utc>> {
    if full_sync {
        return Ok(DateTime::UNIX_EPOCH);
    }
    match since {
        Some(value) => parse_since(value),
        None => Ok(now - Duration::hours(1)),
    }
}
