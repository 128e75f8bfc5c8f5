// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token broker: owns the live token pair and serializes every renewal.
//!
//! All acquisition runs under one async mutex, so concurrent callers that
//! find the pair missing or invalidated wait for a single refresh or login
//! and then share its result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Tuning;
use crate::credential::oauth::{self, RefreshOutcome};
use crate::credential::store::{CredentialStore, MemoryStore};
use crate::credential::{AccessToken, Account, TokenPair};
use crate::error::{Result, XoltaError};
use crate::login::{LoginBridge, LoginRequest, ENDPOINT as LOGIN_ENDPOINT};

#[derive(Default)]
struct BrokerState {
    loaded: bool,
    tokens: TokenPair,
    /// Set after a 401; the current access token must not be handed out again.
    invalidated: bool,
}

pub struct TokenBroker {
    account: Account,
    key: String,
    store: Arc<dyn CredentialStore>,
    login: Option<Arc<dyn LoginBridge>>,
    http: reqwest::Client,
    token_url: String,
    tuning: Tuning,
    state: Mutex<BrokerState>,
    refreshes: AtomicU64,
    logins: AtomicU64,
}

impl TokenBroker {
    /// Create a broker with an in-memory store and no login bridge.
    pub fn new(account: Account, http: reqwest::Client, token_url: impl Into<String>) -> Self {
        let key = account.store_key();
        Self {
            account,
            key,
            store: Arc::new(MemoryStore::new()),
            login: None,
            http,
            token_url: token_url.into(),
            tuning: Tuning::default(),
            state: Mutex::new(BrokerState::default()),
            refreshes: AtomicU64::new(0),
            logins: AtomicU64::new(0),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_login_bridge(mut self, bridge: Arc<dyn LoginBridge>) -> Self {
        self.login = Some(bridge);
        self
    }

    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    /// Key under which this account's pair is persisted.
    pub fn store_key(&self) -> &str {
        &self.key
    }

    /// Successful refresh-token exchanges since startup.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Successful interactive logins since startup.
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    /// Return a usable access token, refreshing or logging in when needed.
    pub async fn ensure_valid_token(&self) -> Result<AccessToken> {
        let mut state = self.state.lock().await;
        self.load_if_needed(&mut state).await;

        if !state.invalidated {
            if let Some(ref access) = state.tokens.access_token {
                return Ok(AccessToken::new(access.clone()));
            }
        }
        self.renew(&mut state).await
    }

    /// Mark the current access token unusable regardless of which one it is.
    pub async fn force_invalidate(&self) {
        let mut state = self.state.lock().await;
        state.invalidated = true;
        debug!("access token invalidated");
    }

    /// Mark `token` unusable, unless a newer token has already replaced it.
    ///
    /// Returns true when the current token was invalidated.
    pub async fn invalidate(&self, token: &AccessToken) -> bool {
        let mut state = self.state.lock().await;
        if state.tokens.access_token.as_deref() == Some(token.as_str()) {
            state.invalidated = true;
            debug!("access token invalidated after 401");
            true
        } else {
            debug!("stale access token reported, keeping the newer one");
            false
        }
    }

    /// Force a full renewal to prove the credentials work.
    pub async fn check(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.load_if_needed(&mut state).await;
        self.renew(&mut state).await.map(|_| ())
    }

    /// Snapshot of the current pair.
    pub async fn tokens(&self) -> TokenPair {
        let mut state = self.state.lock().await;
        self.load_if_needed(&mut state).await;
        state.tokens.clone()
    }

    async fn load_if_needed(&self, state: &mut BrokerState) {
        if state.loaded {
            return;
        }
        state.loaded = true;

        match self.store.load(&self.key).await {
            Ok(pair) if !pair.is_empty() => {
                debug!(key = %self.key, "loaded persisted credentials");
                state.tokens = pair;
            }
            Ok(_) => {}
            Err(e) => warn!(key = %self.key, err = %e, "ignoring unreadable persisted credentials"),
        }

        if state.tokens.refresh_token.is_none() {
            if let Some(configured) = self.account.configured_refresh_token() {
                state.tokens.refresh_token = Some(configured.to_owned());
            }
        }
    }

    async fn renew(&self, state: &mut BrokerState) -> Result<AccessToken> {
        let mut previous_refresh = state.tokens.refresh_token.clone();
        let mut outcome = match previous_refresh {
            Some(ref refresh) => self.exchange(refresh).await?,
            None => {
                debug!("no refresh token available");
                RefreshOutcome::NeedsLogin
            }
        };

        // A persisted token can outlive a reconfigured one; give the
        // configured token a chance before declaring the account expired.
        if matches!(outcome, RefreshOutcome::NeedsLogin) {
            if let Some(configured) = self.account.configured_refresh_token() {
                if previous_refresh.as_deref() != Some(configured) {
                    info!("persisted refresh token rejected, trying the configured one");
                    outcome = self.exchange(configured).await?;
                    previous_refresh = Some(configured.to_owned());
                }
            }
        }

        let pair = match outcome {
            RefreshOutcome::Tokens(resp) => {
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                info!(expires_in = ?resp.expires_in, "access token refreshed");
                resp.into_pair(previous_refresh)
            }
            RefreshOutcome::NeedsLogin => self.interactive_login().await?,
        };
        self.adopt(state, pair).await
    }

    async fn exchange(&self, refresh: &str) -> Result<RefreshOutcome> {
        oauth::exchange_refresh_token(&self.http, &self.token_url, refresh, self.tuning.request_timeout)
            .await
    }

    async fn interactive_login(&self) -> Result<TokenPair> {
        let Some((username, password)) = self.account.login_credentials() else {
            warn!("refresh token rejected and the account has no password to log in with");
            return Err(XoltaError::AuthExpired);
        };
        let Some(ref bridge) = self.login else {
            warn!("refresh token unusable and no login bridge is configured");
            return Err(XoltaError::AuthExpired);
        };

        let request = LoginRequest::new(username, password);
        let corr_id = request.corr_id.clone();
        info!(corr_id = %corr_id, "starting interactive login");

        let response = tokio::time::timeout(self.tuning.login_timeout, bridge.login(request))
            .await
            .map_err(|_| XoltaError::Timeout { endpoint: LOGIN_ENDPOINT.to_owned() })??;
        let duration = response.duration;
        let pair = response.into_tokens(&corr_id)?;

        self.logins.fetch_add(1, Ordering::Relaxed);
        info!(corr_id = %corr_id, duration = ?duration, "interactive login succeeded");
        Ok(pair)
    }

    /// Persist `pair`, then make it current.
    ///
    /// A failed write is logged and the pair is adopted anyway: the provider
    /// may already have rotated the old refresh token out.
    async fn adopt(&self, state: &mut BrokerState, pair: TokenPair) -> Result<AccessToken> {
        let access = pair
            .access_token
            .clone()
            .ok_or_else(|| XoltaError::malformed("token", "no access token issued"))?;

        if let Err(e) = self.store.save(&self.key, &pair).await {
            warn!(key = %self.key, err = %e, "failed to persist credentials");
        }
        state.tokens = pair;
        state.invalidated = false;
        Ok(AccessToken::new(access))
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
