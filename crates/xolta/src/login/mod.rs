// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive login bridge: request/response contract with a browser worker.
//!
//! The vendor's identity provider only issues a first token pair through an
//! interactive web login. A separate worker drives that login and answers one
//! [`LoginResponse`] per [`LoginRequest`], matched by `corr_id`.

pub mod http;
pub mod worker;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::credential::TokenPair;
use crate::error::{Result, XoltaError};

pub(crate) const ENDPOINT: &str = "login";

/// A login job for the worker.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub corr_id: String,
}

impl LoginRequest {
    /// Build a request with a fresh correlation id.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: password.to_owned(),
            corr_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("corr_id", &self.corr_id)
            .finish_non_exhaustive()
    }
}

/// The worker's answer.
///
/// `status` mirrors the identity provider's self-asserted response: `"200"`
/// means logged in, `"400"` means bad credentials, anything else is a worker
/// or provider failure.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub corr_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds the worker spent on the login.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl LoginResponse {
    /// Interpret the response for the request with `corr_id`.
    pub fn into_tokens(self, corr_id: &str) -> Result<TokenPair> {
        if self.corr_id != corr_id {
            return Err(XoltaError::malformed(
                ENDPOINT,
                format!("response for {} does not match request {corr_id}", self.corr_id),
            ));
        }
        let message = self.message.unwrap_or_default();
        match self.status.as_str() {
            "200" => match (self.access_token, self.refresh_token) {
                (Some(access), Some(refresh)) => Ok(TokenPair::new(access, refresh)),
                _ => Err(XoltaError::malformed(ENDPOINT, "status 200 without a token pair")),
            },
            "400" => Err(XoltaError::AuthFailed(if message.is_empty() {
                "invalid username or password".to_owned()
            } else {
                message
            })),
            other => Err(XoltaError::LoginUnavailable(format!("status {other}: {message}"))),
        }
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("corr_id", &self.corr_id)
            .field("status", &self.status)
            .field("message", &self.message)
            .field("duration", &self.duration)
            .finish_non_exhaustive()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }
    Ok(match Raw::deserialize(de)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Performs one interactive login per call.
///
/// Implementations do not time out on their own; the caller bounds the wait.
#[async_trait]
pub trait LoginBridge: Send + Sync {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
