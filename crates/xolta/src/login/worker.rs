// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Login bridge for a worker that pulls jobs and posts answers back.
//!
//! [`WorkerBridge::login`] queues the request and waits on a oneshot keyed by
//! its correlation id. The worker side calls [`WorkerBridge::next_request`]
//! and [`WorkerBridge::complete`], typically through the read API's
//! `/api/v1/login/*` routes.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{oneshot, Notify};

use crate::error::{Result, XoltaError};
use crate::login::{LoginBridge, LoginRequest, LoginResponse, ENDPOINT};

/// Jobs not yet handed to a worker, plus the callers still waiting.
///
/// A job stays queued only while its caller waits for it.
#[derive(Default)]
struct Jobs {
    queue: VecDeque<LoginRequest>,
    pending: HashMap<String, oneshot::Sender<LoginResponse>>,
}

#[derive(Default)]
pub struct WorkerBridge {
    jobs: Mutex<Jobs>,
    ready: Notify,
}

impl WorkerBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait up to `wait` for the next request someone is still waiting on.
    pub async fn next_request(&self, wait: Duration) -> Option<LoginRequest> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(request) = self.pop_queued() {
                return Some(request);
            }
            tokio::time::timeout_at(deadline, notified).await.ok()?;
        }
    }

    /// Deliver a worker's response. Returns false when nobody waits for it.
    pub fn complete(&self, response: LoginResponse) -> bool {
        let waiter = match self.jobs.lock() {
            Ok(mut jobs) => jobs.pending.remove(&response.corr_id),
            Err(_) => None,
        };
        match waiter {
            Some(tx) => tx.send(response).is_ok(),
            None => {
                tracing::debug!(corr_id = %response.corr_id, "login response without waiter");
                false
            }
        }
    }

    /// Number of logins currently awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.jobs.lock().map(|j| j.pending.len()).unwrap_or(0)
    }

    /// Number of requests no worker has picked up yet.
    pub fn queued_count(&self) -> usize {
        self.jobs.lock().map(|j| j.queue.len()).unwrap_or(0)
    }

    fn pop_queued(&self) -> Option<LoginRequest> {
        let mut jobs = self.jobs.lock().ok()?;
        while let Some(request) = jobs.queue.pop_front() {
            if jobs.pending.contains_key(&request.corr_id) {
                return Some(request);
            }
            tracing::debug!(corr_id = %request.corr_id, "skipping abandoned login request");
        }
        None
    }
}

/// Drops the pending entry and the queued job when the waiting caller goes
/// away, so no abandoned password stays in memory.
struct PendingGuard<'a> {
    jobs: &'a Mutex<Jobs>,
    corr_id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.pending.remove(&self.corr_id);
            jobs.queue.retain(|r| r.corr_id != self.corr_id);
        }
    }
}

#[async_trait]
impl LoginBridge for WorkerBridge {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let (tx, rx) = oneshot::channel();
        let corr_id = request.corr_id.clone();
        {
            let mut jobs = self
                .jobs
                .lock()
                .map_err(|_| XoltaError::LoginUnavailable("login queue poisoned".to_owned()))?;
            jobs.pending.insert(corr_id.clone(), tx);
            jobs.queue.push_back(request);
        }
        let _guard = PendingGuard { jobs: &self.jobs, corr_id: corr_id.clone() };
        self.ready.notify_one();
        tracing::debug!(corr_id = %corr_id, "queued interactive login for worker");

        rx.await.map_err(|_| {
            XoltaError::LoginUnavailable(format!("{ENDPOINT}: worker dropped request {corr_id}"))
        })
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
