// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth refresh-token exchange against the vendor's identity provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credential::TokenPair;
use crate::error::{Result, XoltaError};

/// Default token endpoint of the vendor's B2C tenant.
pub const DEFAULT_TOKEN_URL: &str =
    "https://xolta.b2clogin.com/145c2c43-a8da-46ab-b5da-1d4de444ed82/b2c_1_sisu/oauth2/v2.0/token";

/// Provider error code for an expired or revoked refresh token.
pub const EXPIRED_GRANT_CODE: &str = "AADB2C90080";

const ENDPOINT: &str = "token";

/// Standard OAuth2 token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Merge into a pair, keeping `previous_refresh` when the provider did not rotate it.
    pub fn into_pair(self, previous_refresh: Option<String>) -> TokenPair {
        TokenPair {
            access_token: Some(self.access_token),
            refresh_token: self.refresh_token.or(previous_refresh),
        }
    }
}

/// Result of a refresh attempt that did not fail outright.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// New tokens were issued.
    Tokens(TokenResponse),
    /// The refresh token is no longer accepted; an interactive login is needed.
    NeedsLogin,
}

/// Perform a single refresh-token exchange.
///
/// Returns `Err` for anything other than success or the expired-grant code:
/// those failures are not fixed by logging in again.
pub async fn exchange_refresh_token(
    client: &reqwest::Client,
    token_url: &str,
    refresh_token: &str,
    timeout: Duration,
) -> Result<RefreshOutcome> {
    let resp = client
        .post(token_url)
        .timeout(timeout)
        .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
        .send()
        .await
        .map_err(|e| XoltaError::from_reqwest(ENDPOINT, e))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::BAD_REQUEST && text.contains(EXPIRED_GRANT_CODE) {
            tracing::info!("refresh token expired, interactive login required");
            return Ok(RefreshOutcome::NeedsLogin);
        }
        return Err(XoltaError::Http {
            endpoint: ENDPOINT.to_owned(),
            status: status.as_u16(),
            body: text,
        });
    }

    let bytes = resp.bytes().await.map_err(|e| XoltaError::from_reqwest(ENDPOINT, e))?;
    let token: TokenResponse = serde_json::from_slice(&bytes)
        .map_err(|e| XoltaError::malformed(ENDPOINT, e.to_string()))?;
    Ok(RefreshOutcome::Tokens(token))
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
