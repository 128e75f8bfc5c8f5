// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::credential::broker::TokenBroker;
use crate::login::worker::WorkerBridge;
use crate::poller::PollState;

/// How long `/api/v1/login/next` waits for a job before answering 204.
pub const LOGIN_POLL_WAIT: Duration = Duration::from_secs(25);

/// Shared state behind the read API.
pub struct AppState {
    pub poll: Arc<PollState>,
    pub broker: Arc<TokenBroker>,
    /// Present when logins are handed to a polling worker.
    pub worker: Option<Arc<WorkerBridge>>,
    pub auth_token: Option<String>,
    pub login_wait: Duration,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(poll: Arc<PollState>, broker: Arc<TokenBroker>, shutdown: CancellationToken) -> Self {
        Self {
            poll,
            broker,
            worker: None,
            auth_token: None,
            login_wait: LOGIN_POLL_WAIT,
            shutdown,
        }
    }

    pub fn with_worker(mut self, worker: Arc<WorkerBridge>) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token;
        self
    }
}
