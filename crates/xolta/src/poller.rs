// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interval loop around the fetcher and the shared result of the last poll.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, HostSignal, XoltaError};
use crate::telemetry::fetcher::TelemetryFetcher;
use crate::telemetry::FetchResult;

/// Outcome bookkeeping of the poll loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStatus {
    pub polls_ok: u64,
    pub polls_failed: u64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_kind: Option<ErrorKind>,
    pub signal: Option<HostSignal>,
    /// Whether the last failure is expected to clear on a later poll.
    pub transient: bool,
    /// Set once polling stopped for good.
    pub stopped: bool,
}

/// Latest poll result shared between the poller and the read API.
#[derive(Default)]
pub struct PollState {
    latest: RwLock<Option<FetchResult>>,
    status: RwLock<PollStatus>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest(&self) -> Option<FetchResult> {
        self.latest.read().await.clone()
    }

    pub async fn status(&self) -> PollStatus {
        self.status.read().await.clone()
    }

    pub async fn record_success(&self, result: FetchResult) {
        *self.latest.write().await = Some(result);
        let mut status = self.status.write().await;
        status.polls_ok += 1;
        status.last_success = Some(Utc::now());
        status.last_error = None;
        status.last_error_kind = None;
        status.signal = None;
        status.transient = false;
    }

    /// Record a failed poll and return how the host should react.
    ///
    /// Until the first success every non-auth failure is `NotReady`.
    pub async fn record_failure(&self, err: &XoltaError) -> HostSignal {
        let mut status = self.status.write().await;
        let signal = err.signal(status.last_success.is_none());
        status.polls_failed += 1;
        status.last_error = Some(err.to_string());
        status.last_error_kind = Some(err.kind());
        status.signal = Some(signal);
        status.transient = err.is_transient();
        if signal == HostSignal::AuthFailed {
            status.stopped = true;
        }
        signal
    }
}

pub struct Poller {
    fetcher: Arc<TelemetryFetcher>,
    state: Arc<PollState>,
    interval: Duration,
}

impl Poller {
    pub fn new(fetcher: Arc<TelemetryFetcher>, state: Arc<PollState>, interval: Duration) -> Self {
        Self { fetcher, state, interval }
    }

    /// Run one cycle and record it. Returns the host signal on failure.
    pub async fn poll_once(&self) -> Option<HostSignal> {
        match self.fetcher.fetch().await {
            Ok(result) => {
                tracing::debug!(sites = result.sites.len(), "poll succeeded");
                self.state.record_success(result).await;
                None
            }
            Err(e) => {
                let signal = self.state.record_failure(&e).await;
                if e.is_transient() {
                    tracing::warn!(err = %e, kind = %e.kind(), %signal, "poll failed, will retry");
                } else {
                    tracing::error!(err = %e, kind = %e.kind(), %signal, "poll failed");
                }
                Some(signal)
            }
        }
    }

    /// Poll immediately, then every interval, until shutdown or an auth failure.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut timer = tokio::time::interval(self.interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            let signal = tokio::select! {
                _ = shutdown.cancelled() => break,
                signal = self.poll_once() => signal,
            };
            if signal == Some(HostSignal::AuthFailed) {
                tracing::error!("credentials unusable, polling stopped until reconfigured");
                break;
            }
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
