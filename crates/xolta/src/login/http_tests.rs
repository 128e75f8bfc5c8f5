// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{http_client, MockServer};

fn request() -> LoginRequest {
    LoginRequest { username: "alice".into(), password: "pw".into(), corr_id: "corr-1".into() }
}

#[tokio::test]
async fn posts_request_and_parses_response() -> anyhow::Result<()> {
    let body = serde_json::json!({
        "corr_id": "corr-1",
        "status": "200",
        "access_token": "a",
        "refresh_token": "r",
        "duration": 12.5,
    })
    .to_string();
    let server = MockServer::builder().route("/auth", vec![(200, body)]).start().await?;
    let bridge = HttpLoginBridge::new(server.url("/auth"), http_client());

    let resp = bridge.login(request()).await?;
    assert_eq!(resp.status, "200");
    assert_eq!(resp.into_tokens("corr-1")?.access_token.as_deref(), Some("a"));

    let sent: serde_json::Value = serde_json::from_str(&server.requests("/auth")[0].body)?;
    assert_eq!(sent["username"], "alice");
    assert_eq!(sent["password"], "pw");
    assert_eq!(sent["corr_id"], "corr-1");
    Ok(())
}

#[tokio::test]
async fn service_error_is_http_error() -> anyhow::Result<()> {
    let server =
        MockServer::builder().route("/auth", vec![(502, "gateway".to_owned())]).start().await?;
    let bridge = HttpLoginBridge::new(server.url("/auth"), http_client());

    let result = bridge.login(request()).await;
    assert!(matches!(result, Err(XoltaError::Http { status: 502, .. })));
    Ok(())
}

#[tokio::test]
async fn garbage_body_is_malformed() -> anyhow::Result<()> {
    let server =
        MockServer::builder().route("/auth", vec![(200, "<html>".to_owned())]).start().await?;
    let bridge = HttpLoginBridge::new(server.url("/auth"), http_client());

    let result = bridge.login(request()).await;
    assert!(matches!(result, Err(XoltaError::Malformed { .. })));
    Ok(())
}
