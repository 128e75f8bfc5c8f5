// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for the read API.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::login::LoginResponse;
use crate::poller::PollStatus;
use crate::sensor;
use crate::state::AppState;

// -- Request/Response types ---------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `starting` until the first successful poll, then `running`; `stopped`
    /// after an auth failure.
    pub status: String,
    pub polls_ok: u64,
    pub polls_failed: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PollResponse {
    #[serde(flatten)]
    pub status: PollStatus,
    pub token_refreshes: u64,
    pub interactive_logins: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginAck {
    pub accepted: bool,
}

// -- Handlers -----------------------------------------------------------------

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let status = s.poll.status().await;
    let label = if status.stopped {
        "stopped"
    } else if status.last_success.is_some() {
        "running"
    } else {
        "starting"
    };
    Json(HealthResponse {
        status: label.to_owned(),
        polls_ok: status.polls_ok,
        polls_failed: status.polls_failed,
    })
}

/// `GET /api/v1/telemetry`
pub async fn telemetry(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match s.poll.latest().await {
        Some(result) => Json(result).into_response(),
        None => ErrorCode::NotReady.to_http_response("no successful poll yet").into_response(),
    }
}

/// `GET /api/v1/sensors`
pub async fn sensors(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    match s.poll.latest().await {
        Some(result) => Json(sensor::project(&result)).into_response(),
        None => ErrorCode::NotReady.to_http_response("no successful poll yet").into_response(),
    }
}

/// `GET /api/v1/poll`
pub async fn poll_status(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    Json(PollResponse {
        status: s.poll.status().await,
        token_refreshes: s.broker.refresh_count(),
        interactive_logins: s.broker.login_count(),
    })
}

/// `GET /api/v1/login/next`: long-poll for the next login job.
pub async fn login_next(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(ref worker) = s.worker else {
        return ErrorCode::NotFound.to_http_response("login worker not enabled").into_response();
    };

    let next = tokio::select! {
        _ = s.shutdown.cancelled() => None,
        next = worker.next_request(s.login_wait) => next,
    };
    match next {
        Some(request) => {
            tracing::info!(corr_id = %request.corr_id, "login job handed to worker");
            Json(request).into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// `POST /api/v1/login/response`
pub async fn login_response(
    State(s): State<Arc<AppState>>,
    Json(resp): Json<LoginResponse>,
) -> impl IntoResponse {
    let Some(ref worker) = s.worker else {
        return ErrorCode::NotFound.to_http_response("login worker not enabled").into_response();
    };

    let corr_id = resp.corr_id.clone();
    if worker.complete(resp) {
        Json(LoginAck { accepted: true }).into_response()
    } else {
        ErrorCode::NotFound
            .to_http_response(format!("no pending login for {corr_id}"))
            .into_response()
    }
}
