// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry fetched from the vendor: per-site snapshots and daily energy.

pub mod energy;
pub mod fetcher;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::api::SensorSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub site_id: String,
}

/// Energy totals in kWh since the local start of day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergySummary {
    pub pv: f64,
    pub consumption: f64,
    pub battery_charged: f64,
    pub battery_discharged: f64,
    pub grid_imported: f64,
    pub grid_exported: f64,
    /// End of the aggregated window; drives staleness.
    pub end_time: DateTime<Utc>,
    /// Start of the window the totals accumulate from.
    pub last_reset: DateTime<Utc>,
}

/// Result of one fetch cycle, keyed by site id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    pub sites: Vec<Site>,
    pub sensors: BTreeMap<String, SensorSnapshot>,
    pub energy: BTreeMap<String, EnergySummary>,
}
