// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Integration tests for the read API.
//!
//! Uses `axum_test::TestServer`, no real TCP needed.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use tokio_util::sync::CancellationToken;

use xolta_batt::credential::broker::TokenBroker;
use xolta_batt::credential::Account;
use xolta_batt::login::worker::WorkerBridge;
use xolta_batt::login::{LoginBridge, LoginRequest, LoginResponse};
use xolta_batt::poller::PollState;
use xolta_batt::sensor::SensorReading;
use xolta_batt::state::AppState;
use xolta_batt::telemetry::{FetchResult, SensorSnapshot, Site};
use xolta_batt::test_support::http_client;
use xolta_batt::transport::build_router;

fn test_state() -> AppState {
    let account = Account::RefreshToken { site_id: "s1".into(), refresh_token: "rt".into() };
    let broker = TokenBroker::new(account, http_client(), "http://127.0.0.1:9/token");
    AppState::new(Arc::new(PollState::new()), Arc::new(broker), CancellationToken::new())
}

fn test_server(state: AppState) -> anyhow::Result<TestServer> {
    TestServer::new(build_router(Arc::new(state)))
}

fn sample_result() -> FetchResult {
    let mut result = FetchResult { sites: vec![Site { site_id: "s1".into() }], ..FetchResult::default() };
    result.sensors.insert(
        "s1".into(),
        SensorSnapshot {
            state: Some("Running".into()),
            pv_power: Some(2.5),
            battery_soc: Some(80.0),
            ..SensorSnapshot::default()
        },
    );
    result
}

#[tokio::test]
async fn health_reports_poll_counters() -> anyhow::Result<()> {
    let state = test_state();
    let poll = Arc::clone(&state.poll);
    let server = test_server(state)?;

    let resp = server.get("/api/v1/health").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "starting");
    assert_eq!(body["polls_ok"], 0);

    poll.record_success(sample_result()).await;
    let body: serde_json::Value = server.get("/api/v1/health").await.json();
    assert_eq!(body["status"], "running");
    assert_eq!(body["polls_ok"], 1);
    Ok(())
}

#[tokio::test]
async fn telemetry_is_not_ready_before_first_poll() -> anyhow::Result<()> {
    let state = test_state();
    let poll = Arc::clone(&state.poll);
    let server = test_server(state)?;

    let resp = server.get("/api/v1/telemetry").await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "NOT_READY");

    poll.record_success(sample_result()).await;
    let resp = server.get("/api/v1/telemetry").await;
    resp.assert_status_ok();
    let body: FetchResult = resp.json();
    assert_eq!(body.sites, vec![Site { site_id: "s1".into() }]);
    Ok(())
}

#[tokio::test]
async fn sensors_project_latest_result() -> anyhow::Result<()> {
    let state = test_state();
    state.poll.record_success(sample_result()).await;
    let server = test_server(state)?;

    let resp = server.get("/api/v1/sensors").await;
    resp.assert_status_ok();
    let readings: Vec<SensorReading> = resp.json();
    assert_eq!(readings.len(), 11);
    let pv = readings.iter().find(|r| r.unique_id == "s1-pv_power");
    assert_eq!(pv.and_then(|r| r.value), Some(2.5));
    Ok(())
}

#[tokio::test]
async fn poll_status_includes_last_error() -> anyhow::Result<()> {
    let state = test_state();
    state.poll.record_failure(&xolta_batt::error::XoltaError::AuthExpired).await;
    let server = test_server(state)?;

    let body: serde_json::Value = server.get("/api/v1/poll").await.json();
    assert_eq!(body["signal"], "AUTH_FAILED");
    assert_eq!(body["stopped"], true);
    assert_eq!(body["polls_failed"], 1);
    assert_eq!(body["token_refreshes"], 0);

    let body: serde_json::Value = server.get("/api/v1/health").await.json();
    assert_eq!(body["status"], "stopped");
    Ok(())
}

#[tokio::test]
async fn bearer_auth_guards_everything_but_health() -> anyhow::Result<()> {
    let state = test_state().with_auth_token(Some("secret".into()));
    state.poll.record_success(sample_result()).await;
    let server = test_server(state)?;

    server.get("/api/v1/health").await.assert_status_ok();
    server.get("/api/v1/telemetry").await.assert_status(StatusCode::UNAUTHORIZED);
    server
        .get("/api/v1/telemetry")
        .authorization_bearer("wrong")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    server.get("/api/v1/telemetry").authorization_bearer("secret").await.assert_status_ok();
    Ok(())
}

#[tokio::test]
async fn login_routes_are_absent_without_worker() -> anyhow::Result<()> {
    let server = test_server(test_state())?;
    server.get("/api/v1/login/next").await.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn worker_round_trip_resolves_login() -> anyhow::Result<()> {
    let worker = Arc::new(WorkerBridge::new());
    let mut state = test_state().with_worker(Arc::clone(&worker));
    state.login_wait = Duration::from_millis(50);
    let server = test_server(state)?;

    // Idle worker poll.
    server.get("/api/v1/login/next").await.assert_status(StatusCode::NO_CONTENT);

    let caller = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.login(LoginRequest::new("alice", "pw")).await })
    };
    while worker.pending_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let resp = server.get("/api/v1/login/next").await;
    resp.assert_status_ok();
    let job: LoginRequest = resp.json();
    assert_eq!(job.username, "alice");
    assert_eq!(job.password, "pw");

    let answer = LoginResponse {
        corr_id: job.corr_id.clone(),
        status: "200".into(),
        message: None,
        access_token: Some("a".into()),
        refresh_token: Some("r".into()),
        duration: Some(4.2),
    };
    let resp = server.post("/api/v1/login/response").json(&answer).await;
    resp.assert_status_ok();

    let login = tokio::time::timeout(Duration::from_secs(5), caller).await???;
    assert_eq!(login.corr_id, job.corr_id);

    // A second answer for the same job has no waiter.
    server.post("/api/v1/login/response").json(&answer).await.assert_status(StatusCode::NOT_FOUND);
    Ok(())
}
