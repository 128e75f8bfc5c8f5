// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fetch cycle: site list, per-site status, and rate-limited energy summaries.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::api::client::XoltaClient;
use crate::config::Tuning;
use crate::credential::broker::TokenBroker;
use crate::credential::AccessToken;
use crate::error::{Result, XoltaError};
use crate::telemetry::energy::{aggregate, day_window, is_stale};
use crate::telemetry::{EnergySummary, FetchResult, SensorSnapshot, Site};

/// Cached between cycles. Each entry is written only once its request succeeded.
#[derive(Default)]
struct FetchState {
    sites: Option<Vec<Site>>,
    sensors: BTreeMap<String, SensorSnapshot>,
    energy: BTreeMap<String, EnergySummary>,
}

pub struct TelemetryFetcher {
    broker: Arc<TokenBroker>,
    client: XoltaClient,
    tuning: Tuning,
    state: Mutex<FetchState>,
}

impl TelemetryFetcher {
    pub fn new(broker: Arc<TokenBroker>, client: XoltaClient, tuning: Tuning) -> Self {
        Self { broker, client, tuning, state: Mutex::new(FetchState::default()) }
    }

    pub fn broker(&self) -> &Arc<TokenBroker> {
        &self.broker
    }

    /// Run one fetch cycle.
    ///
    /// A 401 from any endpoint invalidates the token and restarts the cycle,
    /// at most `token_retries` times per call. Cycles are serialized.
    pub async fn fetch(&self) -> Result<FetchResult> {
        let mut state = self.state.lock().await;
        let budget = self.tuning.token_retries;
        let mut retries_left = budget;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let token = self.broker.ensure_valid_token().await?;
            match self.attempt(&mut state, &token).await {
                Err(XoltaError::Unauthorized { endpoint }) => {
                    if retries_left == 0 {
                        warn!(endpoint, attempt, "still unauthorized, retry budget exhausted");
                        return Err(XoltaError::RetryBudgetExhausted { budget });
                    }
                    retries_left -= 1;
                    info!(endpoint, attempt, retries_left, "unauthorized, renewing token");
                    self.broker.invalidate(&token).await;
                }
                other => return other,
            }
        }
    }

    async fn attempt(&self, state: &mut FetchState, token: &AccessToken) -> Result<FetchResult> {
        let sites = self.sites(state, token).await?;
        let now = Utc::now();
        let max_age = TimeDelta::from_std(self.tuning.energy_refresh)
            .unwrap_or_else(|_| TimeDelta::minutes(10));
        let resolution = self.tuning.resolution_mins;

        for site in &sites {
            let snapshot = self.client.site_status(token, &site.site_id).await?;
            debug!(site_id = %site.site_id, state = ?snapshot.state, "site status");
            state.sensors.insert(site.site_id.clone(), snapshot);

            if is_stale(state.energy.get(&site.site_id), now, max_age) {
                let (from, to) = day_window(now);
                let buckets =
                    self.client.data_summary(token, &site.site_id, from, to, resolution).await?;
                let summary = aggregate(&buckets, resolution, from, now);
                debug!(
                    site_id = %site.site_id,
                    buckets = buckets.len(),
                    end_time = %summary.end_time,
                    "energy summary recomputed"
                );
                state.energy.insert(site.site_id.clone(), summary);
            }
        }

        Ok(FetchResult {
            sensors: sites
                .iter()
                .filter_map(|s| Some((s.site_id.clone(), state.sensors.get(&s.site_id)?.clone())))
                .collect(),
            energy: sites
                .iter()
                .filter_map(|s| Some((s.site_id.clone(), state.energy.get(&s.site_id)?.clone())))
                .collect(),
            sites,
        })
    }

    async fn sites(&self, state: &mut FetchState, token: &AccessToken) -> Result<Vec<Site>> {
        if let Some(ref sites) = state.sites {
            return Ok(sites.clone());
        }

        let sites: Vec<Site> = match self.broker.account().pinned_site() {
            Some(site_id) => vec![Site { site_id: site_id.to_owned() }],
            None => self
                .client
                .site_group(token)
                .await?
                .into_iter()
                .map(|site_id| Site { site_id })
                .collect(),
        };

        if sites.is_empty() {
            warn!("account has no sites");
        } else {
            info!(count = sites.len(), "site list cached");
            state.sites = Some(sites.clone());
        }
        Ok(sites)
    }
}

#[cfg(test)]
#[path = "fetcher_tests.rs"]
mod tests;
