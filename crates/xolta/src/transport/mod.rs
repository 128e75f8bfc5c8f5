// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read API: latest poll results plus the worker side of the login bridge.

pub mod auth;
pub mod http;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(http::health))
        // Poll results
        .route("/api/v1/telemetry", get(http::telemetry))
        .route("/api/v1/sensors", get(http::sensors))
        .route("/api/v1/poll", get(http::poll_status))
        // Login worker (404 unless the worker bridge is enabled)
        .route("/api/v1/login/next", get(http::login_next))
        .route("/api/v1/login/response", post(http::login_response))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
