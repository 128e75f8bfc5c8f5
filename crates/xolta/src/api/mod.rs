// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire models for the vendor REST API.

pub mod client;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// `GET SiteGroup` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteGroupResponse {
    #[serde(default)]
    pub sites: Vec<SiteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    #[serde(rename = "siteId")]
    pub site_id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// `GET siteStatus` response. Only the first element of `data` is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteStatusResponse {
    #[serde(default)]
    pub data: Vec<SensorSnapshot>,
}

/// Instantaneous readings of one site, in kW and percent.
///
/// Accepts the vendor's field names and serializes with short ones. Fields
/// the vendor adds beyond these are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    #[serde(default)]
    pub state: Option<String>,
    /// Battery flow; negative while charging.
    #[serde(default, alias = "inverterActivePowerAggAvg")]
    pub inverter_active_power: Option<f64>,
    #[serde(default, alias = "meterPvActivePowerAggAvg")]
    pub pv_power: Option<f64>,
    #[serde(default)]
    pub consumption: Option<f64>,
    #[serde(default, alias = "bmsSocRawArrayCloudTrimmedAggAvg")]
    pub battery_soc: Option<f64>,
    /// Grid flow; negative while exporting.
    #[serde(default, alias = "meterGridActivePowerAggAvg")]
    pub grid_power: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SensorSnapshot {
    pub fn is_running(&self) -> bool {
        self.state.as_deref() == Some("Running")
    }
}

/// `GET GetDataSummary` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSummaryResponse {
    #[serde(default)]
    pub telemetry: Vec<Bucket>,
}

/// Average power over one resolution interval. Null values count as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(rename = "utcEndTime", default)]
    pub utc_end_time: Option<String>,
    #[serde(rename = "meterPvActivePowerAggAvgSiteSingle", default)]
    pub pv: Option<f64>,
    #[serde(rename = "calculatedConsumption", default)]
    pub consumption: Option<f64>,
    #[serde(rename = "inverterActivePowerAggAvgSiteSum", default)]
    pub inverter: Option<f64>,
    #[serde(rename = "meterGridActivePowerAggAvgSiteSingle", default)]
    pub grid: Option<f64>,
}

/// Format as the vendor expects: UTC, millisecond precision, `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a vendor timestamp. Values without an offset are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok().map(|ts| ts.and_utc())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
