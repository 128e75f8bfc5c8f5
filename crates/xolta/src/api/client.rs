// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client for the vendor REST API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::{
    format_timestamp, Bucket, DataSummaryResponse, SensorSnapshot, SiteGroupResponse,
    SiteStatusResponse,
};
use crate::credential::AccessToken;
use crate::error::{Result, XoltaError};

pub const DEFAULT_API_BASE_URL: &str =
    "https://xoltarmcluster2.northeurope.cloudapp.azure.com:19081/Xolta.Rm.Base.App/Xolta.Rm.Base.Api/api/";

pub const SITE_GROUP: &str = "SiteGroup";
pub const SITE_STATUS: &str = "siteStatus";
pub const DATA_SUMMARY: &str = "GetDataSummary";

/// Bearer-authenticated client for one API base URL.
pub struct XoltaClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl XoltaClient {
    pub fn new(base_url: impl Into<String>, client: Client, timeout: Duration) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        Self { base_url, client, timeout }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &AccessToken,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(self.url(endpoint))
            .bearer_auth(token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CACHE_CONTROL, "no-cache")
            .query(query)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| XoltaError::from_reqwest(endpoint, e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(XoltaError::Unauthorized { endpoint: endpoint.to_owned() });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(XoltaError::Http {
                endpoint: endpoint.to_owned(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| XoltaError::from_reqwest(endpoint, e))?;
        serde_json::from_slice(&bytes).map_err(|e| XoltaError::malformed(endpoint, e.to_string()))
    }

    /// Site ids visible to the account.
    pub async fn site_group(&self, token: &AccessToken) -> Result<Vec<String>> {
        let resp: SiteGroupResponse = self.get_json(SITE_GROUP, token, &[]).await?;
        Ok(resp.sites.into_iter().map(|s| s.site_id).collect())
    }

    /// Current readings of one site.
    pub async fn site_status(&self, token: &AccessToken, site_id: &str) -> Result<SensorSnapshot> {
        let resp: SiteStatusResponse =
            self.get_json(SITE_STATUS, token, &[("siteId", site_id.to_owned())]).await?;
        resp.data
            .into_iter()
            .next()
            .ok_or_else(|| XoltaError::malformed(SITE_STATUS, format!("no data for site {site_id}")))
    }

    /// Power buckets of one site between `from` and `to`.
    pub async fn data_summary(
        &self,
        token: &AccessToken,
        site_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        resolution_mins: u32,
    ) -> Result<Vec<Bucket>> {
        let query = [
            ("siteId", site_id.to_owned()),
            ("CalculateConsumptionNeeded", "true".to_owned()),
            ("fromDateTime", format_timestamp(from)),
            ("toDateTime", format_timestamp(to)),
            ("resolutionMin", resolution_mins.to_string()),
        ];
        let resp: DataSummaryResponse = self.get_json(DATA_SUMMARY, token, &query).await?;
        Ok(resp.telemetry)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
