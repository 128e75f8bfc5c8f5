// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential handling: token pair ownership, OAuth refresh, persistence.
//!
//! The [`broker::TokenBroker`] is the only owner of the live token pair. It
//! loads the persisted copy lazily, refreshes through [`oauth`], falls back to
//! the interactive login bridge, and writes every new pair to a
//! [`store::CredentialStore`].

pub mod broker;
pub mod oauth;
pub mod store;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Access/refresh token pair. Either side may be absent before the first login.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: Some(access_token.into()), refresh_token: Some(refresh_token.into()) }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

// Tokens never reach log output.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Bearer token handed out by the broker for a single round of requests.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Which vendor account the client works for.
#[derive(Clone, PartialEq, Eq)]
pub enum Account {
    /// Username/password; tokens come from the interactive login bridge.
    Password { username: String, password: String },
    /// A single site with a refresh token obtained out of band.
    RefreshToken { site_id: String, refresh_token: String },
}

impl Account {
    /// Stable identifier of the account (username or site id).
    pub fn identifier(&self) -> &str {
        match self {
            Self::Password { username, .. } => username,
            Self::RefreshToken { site_id, .. } => site_id,
        }
    }

    /// Credential store key: hashed so usernames do not appear in file names.
    pub fn store_key(&self) -> String {
        let digest = Sha256::digest(format!("xolta_batt:{}", self.identifier()).as_bytes());
        digest.iter().take(16).map(|b| format!("{b:02x}")).collect()
    }

    /// Username and password, when this account can log in interactively.
    pub fn login_credentials(&self) -> Option<(&str, &str)> {
        match self {
            Self::Password { username, password } => Some((username, password)),
            Self::RefreshToken { .. } => None,
        }
    }

    /// Site pinned by configuration, if any.
    pub fn pinned_site(&self) -> Option<&str> {
        match self {
            Self::Password { .. } => None,
            Self::RefreshToken { site_id, .. } => Some(site_id),
        }
    }

    /// Refresh token supplied by configuration, if any.
    pub fn configured_refresh_token(&self) -> Option<&str> {
        match self {
            Self::Password { .. } => None,
            Self::RefreshToken { refresh_token, .. } => Some(refresh_token),
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { username, .. } => {
                f.debug_struct("Password").field("username", username).finish_non_exhaustive()
            }
            Self::RefreshToken { site_id, .. } => {
                f.debug_struct("RefreshToken").field("site_id", site_id).finish_non_exhaustive()
            }
        }
    }
}

/// Resolve the default state directory for persisted credentials.
///
/// Checks `$XDG_STATE_HOME/xolta-batt`, then `$HOME/.local/state/xolta-batt`.
pub fn default_state_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("xolta-batt");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/xolta-batt");
    }
    PathBuf::from(".xolta-batt")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
