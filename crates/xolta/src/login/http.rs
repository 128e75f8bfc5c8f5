// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login bridge backed by a remote worker service.

use async_trait::async_trait;

use crate::error::{Result, XoltaError};
use crate::login::{LoginBridge, LoginRequest, LoginResponse, ENDPOINT};

/// POSTs each [`LoginRequest`] as JSON and reads the [`LoginResponse`] from the
/// same exchange.
pub struct HttpLoginBridge {
    url: String,
    client: reqwest::Client,
}

impl HttpLoginBridge {
    pub fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }
}

#[async_trait]
impl LoginBridge for HttpLoginBridge {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        tracing::debug!(corr_id = %request.corr_id, url = %self.url, "requesting interactive login");
        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| XoltaError::from_reqwest(ENDPOINT, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(XoltaError::Http {
                endpoint: ENDPOINT.to_owned(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| XoltaError::from_reqwest(ENDPOINT, e))?;
        serde_json::from_slice(&bytes).map_err(|e| XoltaError::malformed(ENDPOINT, e.to_string()))
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
