// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bucket aggregation for the daily energy summary.

use chrono::{DateTime, Local, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::api::{parse_timestamp, Bucket};
use crate::telemetry::EnergySummary;

/// Query window for today's summary: local midnight up to `now`.
pub fn day_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    (start_of_day(now, &Local), now)
}

/// Local midnight of `now`'s date in `tz`, as UTC.
///
/// Where a DST change skips midnight the first existing hour of the day is used.
pub fn start_of_day<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let midnight = now.with_timezone(tz).date_naive().and_time(NaiveTime::MIN);
    (0..24)
        .find_map(|h| tz.from_local_datetime(&(midnight + TimeDelta::hours(h))).earliest())
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or(now)
}

/// True when `summary` is missing or its window ended `max_age` or more ago.
pub fn is_stale(summary: Option<&EnergySummary>, now: DateTime<Utc>, max_age: TimeDelta) -> bool {
    match summary {
        None => true,
        Some(s) => now - s.end_time >= max_age,
    }
}

/// Integrate average-power buckets into kWh totals.
///
/// Each bucket covers `resolution_mins`. Battery and grid flows are split by
/// sign: negative inverter power is charging, negative grid power is export.
/// `end_time` is the last bucket's end, or `now` when there are none.
pub fn aggregate(
    buckets: &[Bucket],
    resolution_mins: u32,
    last_reset: DateTime<Utc>,
    now: DateTime<Utc>,
) -> EnergySummary {
    let hours = f64::from(resolution_mins) / 60.0;
    // `+ 0.0` turns a negative-zero total into zero.
    let sum = |f: fn(&Bucket) -> f64| buckets.iter().map(f).sum::<f64>() * hours + 0.0;

    let end_time = match buckets.last() {
        None => now,
        Some(last) => match last.utc_end_time.as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                tracing::warn!(raw = ?last.utc_end_time, "unparseable bucket end time, using now");
                now
            }
        },
    };

    EnergySummary {
        pv: sum(|b| b.pv.unwrap_or(0.0)),
        consumption: sum(|b| b.consumption.unwrap_or(0.0)),
        battery_charged: sum(|b| -b.inverter.unwrap_or(0.0).min(0.0)),
        battery_discharged: sum(|b| b.inverter.unwrap_or(0.0).max(0.0)),
        grid_imported: sum(|b| b.grid.unwrap_or(0.0).max(0.0)),
        grid_exported: sum(|b| -b.grid.unwrap_or(0.0).min(0.0)),
        end_time,
        last_reset,
    }
}

#[cfg(test)]
#[path = "energy_tests.rs"]
mod tests;
