// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named sensor readings derived from a [`FetchResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::telemetry::{EnergySummary, FetchResult, SensorSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Power,
    Battery,
    Energy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    TotalIncreasing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// `{site_id}-{key}`.
    pub unique_id: String,
    pub site_id: String,
    pub key: String,
    pub name: String,
    pub device_class: DeviceClass,
    pub state_class: StateClass,
    pub unit: String,
    /// `None` when the vendor did not report the value.
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reset: Option<DateTime<Utc>>,
}

struct PowerField {
    key: &'static str,
    name: &'static str,
    device_class: DeviceClass,
    unit: &'static str,
    read: fn(&SensorSnapshot) -> Option<f64>,
}

const POWER: [PowerField; 5] = [
    PowerField {
        key: "battery_power",
        name: "Battery power flow",
        device_class: DeviceClass::Power,
        unit: "kW",
        read: |s| s.inverter_active_power,
    },
    PowerField {
        key: "pv_power",
        name: "PV power",
        device_class: DeviceClass::Power,
        unit: "kW",
        read: |s| s.pv_power,
    },
    PowerField {
        key: "consumption_power",
        name: "Power consumption",
        device_class: DeviceClass::Power,
        unit: "kW",
        read: |s| s.consumption,
    },
    PowerField {
        key: "battery_level",
        name: "Battery charge level",
        device_class: DeviceClass::Battery,
        unit: "%",
        read: |s| s.battery_soc,
    },
    PowerField {
        key: "grid_power",
        name: "Grid power flow",
        device_class: DeviceClass::Power,
        unit: "kW",
        read: |s| s.grid_power,
    },
];

const ENERGY: [(&str, &str, fn(&EnergySummary) -> f64); 6] = [
    ("energy_grid_imported", "Grid energy imported", |e| e.grid_imported),
    ("energy_grid_exported", "Grid energy exported", |e| e.grid_exported),
    ("energy_battery_charged", "Battery energy charged", |e| e.battery_charged),
    ("energy_battery_discharged", "Battery energy discharged", |e| e.battery_discharged),
    ("energy_pv", "PV energy", |e| e.pv),
    ("energy_consumption", "Energy consumption", |e| e.consumption),
];

/// Project every site of `result` into its eleven readings.
///
/// Instantaneous readings are zero while a site is not `Running`.
pub fn project(result: &FetchResult) -> Vec<SensorReading> {
    let mut readings = Vec::with_capacity(result.sites.len() * (POWER.len() + ENERGY.len()));
    for site in &result.sites {
        let site_id = &site.site_id;
        let snapshot = result.sensors.get(site_id);
        let status_text = snapshot.and_then(|s| s.state.clone());
        let running = snapshot.is_some_and(SensorSnapshot::is_running);

        for field in &POWER {
            let value = match snapshot {
                Some(s) if running => (field.read)(s),
                Some(_) => Some(0.0),
                None => None,
            };
            readings.push(SensorReading {
                unique_id: format!("{site_id}-{}", field.key),
                site_id: site_id.clone(),
                key: field.key.to_owned(),
                name: field.name.to_owned(),
                device_class: field.device_class,
                state_class: StateClass::Measurement,
                unit: field.unit.to_owned(),
                value,
                status_text: status_text.clone(),
                last_reset: None,
            });
        }

        let summary = result.energy.get(site_id);
        for (key, name, read) in ENERGY {
            readings.push(SensorReading {
                unique_id: format!("{site_id}-{key}"),
                site_id: site_id.clone(),
                key: key.to_owned(),
                name: name.to_owned(),
                device_class: DeviceClass::Energy,
                state_class: StateClass::TotalIncreasing,
                unit: "kWh".to_owned(),
                value: summary.map(read),
                status_text: None,
                last_reset: summary.map(|s| s.last_reset),
            });
        }
    }
    readings
}

#[cfg(test)]
#[path = "sensor_tests.rs"]
mod tests;
