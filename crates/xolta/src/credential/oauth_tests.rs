// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use crate::test_support::{http_client, token_body, MockServer};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn success_returns_tokens_and_posts_form() -> anyhow::Result<()> {
    let server =
        MockServer::builder().route("/token", vec![(200, token_body("a1", "r1"))]).start().await?;
    let client = http_client();

    let outcome =
        exchange_refresh_token(&client, &server.url("/token"), "old-refresh", TIMEOUT).await?;
    let RefreshOutcome::Tokens(token) = outcome else {
        anyhow::bail!("expected tokens, got {outcome:?}");
    };
    assert_eq!(token.access_token, "a1");
    assert_eq!(token.refresh_token.as_deref(), Some("r1"));

    let requests = server.requests("/token");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].body.contains("grant_type=refresh_token"));
    assert!(requests[0].body.contains("refresh_token=old-refresh"));
    Ok(())
}

#[tokio::test]
async fn expired_grant_code_means_needs_login() -> anyhow::Result<()> {
    let body = r#"{"error":"invalid_grant","error_description":"AADB2C90080: The provided grant has expired."}"#;
    let server =
        MockServer::builder().route("/token", vec![(400, body.to_owned())]).start().await?;
    let client = http_client();

    let outcome = exchange_refresh_token(&client, &server.url("/token"), "rt", TIMEOUT).await?;
    assert!(matches!(outcome, RefreshOutcome::NeedsLogin));
    Ok(())
}

#[tokio::test]
async fn other_bad_request_is_fatal() -> anyhow::Result<()> {
    let body = r#"{"error":"invalid_request","error_description":"AADB2C90117: bad scope"}"#;
    let server =
        MockServer::builder().route("/token", vec![(400, body.to_owned())]).start().await?;
    let client = http_client();

    let err = exchange_refresh_token(&client, &server.url("/token"), "rt", TIMEOUT).await.err();
    match err {
        Some(XoltaError::Http { status, endpoint, .. }) => {
            assert_eq!(status, 400);
            assert_eq!(endpoint, "token");
        }
        other => anyhow::bail!("expected HTTP error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn expired_code_on_server_error_is_not_login() -> anyhow::Result<()> {
    let server = MockServer::builder()
        .route("/token", vec![(500, EXPIRED_GRANT_CODE.to_owned())])
        .start()
        .await?;
    let client = http_client();

    let result = exchange_refresh_token(&client, &server.url("/token"), "rt", TIMEOUT).await;
    assert!(matches!(result, Err(XoltaError::Http { status: 500, .. })));
    Ok(())
}

#[tokio::test]
async fn malformed_body_is_reported() -> anyhow::Result<()> {
    let server = MockServer::builder()
        .route("/token", vec![(200, r#"{"token":"nope"}"#.to_owned())])
        .start()
        .await?;
    let client = http_client();

    let result = exchange_refresh_token(&client, &server.url("/token"), "rt", TIMEOUT).await;
    assert!(matches!(result, Err(XoltaError::Malformed { .. })));
    Ok(())
}

#[tokio::test]
async fn slow_endpoint_times_out() -> anyhow::Result<()> {
    let server = MockServer::builder()
        .route("/token", vec![(200, token_body("a", "r"))])
        .delay(Duration::from_millis(500))
        .start()
        .await?;
    let client = http_client();

    let result = exchange_refresh_token(
        &client,
        &server.url("/token"),
        "rt",
        Duration::from_millis(50),
    )
    .await;
    assert!(matches!(result, Err(XoltaError::Timeout { .. })));
    Ok(())
}

#[test]
fn into_pair_keeps_previous_refresh_when_not_rotated() {
    let token = TokenResponse { access_token: "a".into(), refresh_token: None, expires_in: None };
    let pair = token.into_pair(Some("old".into()));
    assert_eq!(pair, TokenPair::new("a", "old"));
}
