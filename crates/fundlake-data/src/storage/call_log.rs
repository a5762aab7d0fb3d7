//! API call timestamps.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::error::Result;

/// Single `timestamp` column, RFC 3339.
pub fn write_calls(path: &Path, calls: &[DateTime<Utc>]) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)?;
    writer.write_record(["timestamp"])?;
    for call in calls {
        writer.write_record([call.to_rfc3339()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Call counts per wall-clock minute.
pub fn calls_per_minute(calls: &[DateTime<Utc>]) -> BTreeMap<DateTime<Utc>, usize> {
    let mut buckets = BTreeMap::new();
    for call in calls {
        let minute = call
            .duration_trunc(TimeDelta::minutes(1))
            .unwrap_or(*call);
        *buckets.entry(minute).or_insert(0) += 1;
    }
    buckets
}

/// Busiest minute's call count.
pub fn peak_calls_per_minute(calls: &[DateTime<Utc>]) -> usize {
    calls_per_minute(calls).into_values().max().unwrap_or(0)
}
