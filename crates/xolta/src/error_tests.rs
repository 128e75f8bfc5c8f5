// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn http(status: u16) -> XoltaError {
    XoltaError::Http { endpoint: "siteStatus".into(), status, body: String::new() }
}

#[yare::parameterized(
    server_error = { http(503), ErrorKind::TransientNetwork },
    rate_limited = { http(429), ErrorKind::TransientNetwork },
    not_found = { http(404), ErrorKind::Rejected },
    timeout = { XoltaError::Timeout { endpoint: "SiteGroup".into() }, ErrorKind::Timeout },
    login_unavailable = { XoltaError::LoginUnavailable("500".into()), ErrorKind::TransientNetwork },
    auth_failed = { XoltaError::AuthFailed("bad password".into()), ErrorKind::AuthFailed },
    budget = { XoltaError::RetryBudgetExhausted { budget: 2 }, ErrorKind::RetryBudgetExhausted },
    storage = { XoltaError::Storage("disk full".into()), ErrorKind::Storage },
)]
fn kind_classification(err: XoltaError, expected: ErrorKind) {
    assert_eq!(err.kind(), expected);
}

#[yare::parameterized(
    auth_first = { XoltaError::AuthExpired, true, HostSignal::AuthFailed },
    auth_later = { XoltaError::AuthFailed("x".into()), false, HostSignal::AuthFailed },
    network_first = { http(502), true, HostSignal::NotReady },
    network_later = { http(502), false, HostSignal::UpdateFailed },
    budget_later = { XoltaError::RetryBudgetExhausted { budget: 2 }, false, HostSignal::UpdateFailed },
)]
fn signal_mapping(err: XoltaError, first_refresh: bool, expected: HostSignal) {
    assert_eq!(err.signal(first_refresh), expected);
}

#[test]
fn transient_excludes_auth_and_malformed() {
    assert!(XoltaError::RetryBudgetExhausted { budget: 2 }.is_transient());
    assert!(XoltaError::Timeout { endpoint: "token".into() }.is_transient());
    assert!(!XoltaError::AuthFailed("nope".into()).is_transient());
    assert!(!XoltaError::malformed("siteStatus", "empty data").is_transient());
}

#[test]
fn display_carries_endpoint_and_status() {
    let msg = http(500).to_string();
    assert!(msg.contains("siteStatus"));
    assert!(msg.contains("500"));
}

#[test]
fn error_code_statuses() {
    assert_eq!(ErrorCode::NotReady.http_status(), 503);
    assert_eq!(ErrorCode::Unauthorized.as_str(), "UNAUTHORIZED");
    let body = ErrorCode::NotFound.to_error_body("nothing here");
    assert_eq!(body.code, "NOT_FOUND");
    assert_eq!(body.message, "nothing here");
}
