// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result alias for operations that talk to the vendor or the login bridge.
pub type Result<T> = std::result::Result<T, XoltaError>;

/// Failure class of an [`XoltaError`], stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    TransientNetwork,
    Timeout,
    Rejected,
    Unauthorized,
    AuthExpired,
    AuthFailed,
    RetryBudgetExhausted,
    Malformed,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TransientNetwork => "TRANSIENT_NETWORK",
            Self::Timeout => "TIMEOUT",
            Self::Rejected => "REJECTED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::AuthExpired => "AUTH_EXPIRED",
            Self::AuthFailed => "AUTH_FAILED",
            Self::RetryBudgetExhausted => "RETRY_BUDGET_EXHAUSTED",
            Self::Malformed => "MALFORMED_RESPONSE",
            Self::Storage => "STORAGE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the host reacts to a failed poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostSignal {
    /// Setup could not complete yet; try again later.
    NotReady,
    /// Credentials are unusable; polling stops until reconfigured.
    AuthFailed,
    /// This cycle failed; the next scheduled cycle runs as usual.
    UpdateFailed,
}

impl HostSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReady => "NOT_READY",
            Self::AuthFailed => "AUTH_FAILED",
            Self::UpdateFailed => "UPDATE_FAILED",
        }
    }
}

impl fmt::Display for HostSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the token broker, login bridge, and telemetry fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XoltaError {
    /// Connection failure or a transport-level error before a status arrived.
    Network { endpoint: String, message: String },
    /// The request did not complete within its timeout.
    Timeout { endpoint: String },
    /// Non-success status other than 401.
    Http { endpoint: String, status: u16, body: String },
    /// 401 from a bearer-authenticated endpoint.
    Unauthorized { endpoint: String },
    /// The refresh token was rejected and there is no way to log in again.
    AuthExpired,
    /// The login bridge rejected the username/password.
    AuthFailed(String),
    /// The login bridge answered with a non-definitive status.
    LoginUnavailable(String),
    /// More 401 responses in one fetch cycle than the retry budget allows.
    RetryBudgetExhausted { budget: u32 },
    /// A response body did not have the expected shape.
    Malformed { endpoint: String, message: String },
    /// The credential store could not be read or written.
    Storage(String),
}

impl XoltaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::LoginUnavailable(_) => ErrorKind::TransientNetwork,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Http { status, .. } if *status >= 500 || *status == 429 => {
                ErrorKind::TransientNetwork
            }
            Self::Http { .. } => ErrorKind::Rejected,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::AuthExpired => ErrorKind::AuthExpired,
            Self::AuthFailed(_) => ErrorKind::AuthFailed,
            Self::RetryBudgetExhausted { .. } => ErrorKind::RetryBudgetExhausted,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// True when retrying cannot help and the user must reconfigure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthExpired | Self::AuthFailed(_))
    }

    /// True for failures the next scheduled poll may recover from.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::TransientNetwork
                | ErrorKind::Timeout
                | ErrorKind::Unauthorized
                | ErrorKind::RetryBudgetExhausted
        )
    }

    /// Map to the host signal for a poll that failed with this error.
    pub fn signal(&self, first_refresh: bool) -> HostSignal {
        if self.is_auth_failure() {
            HostSignal::AuthFailed
        } else if first_refresh {
            HostSignal::NotReady
        } else {
            HostSignal::UpdateFailed
        }
    }

    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { endpoint: endpoint.to_owned() }
        } else if err.is_decode() {
            Self::Malformed { endpoint: endpoint.to_owned(), message: err.to_string() }
        } else {
            Self::Network { endpoint: endpoint.to_owned(), message: err.to_string() }
        }
    }

    pub(crate) fn malformed(endpoint: &str, message: impl Into<String>) -> Self {
        Self::Malformed { endpoint: endpoint.to_owned(), message: message.into() }
    }
}

impl fmt::Display for XoltaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { endpoint, message } => write!(f, "{endpoint}: network error: {message}"),
            Self::Timeout { endpoint } => write!(f, "{endpoint}: request timed out"),
            Self::Http { endpoint, status, body } => write!(f, "{endpoint}: HTTP {status}: {body}"),
            Self::Unauthorized { endpoint } => write!(f, "{endpoint}: unauthorized"),
            Self::AuthExpired => f.write_str("refresh token expired, reconfigure the account"),
            Self::AuthFailed(msg) => write!(f, "authentication failed: {msg}"),
            Self::LoginUnavailable(msg) => write!(f, "interactive login unavailable: {msg}"),
            Self::RetryBudgetExhausted { budget } => {
                write!(f, "gave up after {budget} token renewals in one cycle")
            }
            Self::Malformed { endpoint, message } => {
                write!(f, "{endpoint}: malformed response: {message}")
            }
            Self::Storage(msg) => write!(f, "credential store: {msg}"),
        }
    }
}

impl std::error::Error for XoltaError {}

/// Error codes for the read API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    Unauthorized,
    BadRequest,
    NotReady,
    NotFound,
    Internal,
}

impl ErrorCode {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::BadRequest => 400,
            Self::NotReady => 503,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotReady => "NOT_READY",
            Self::NotFound => "NOT_FOUND",
            Self::Internal => "INTERNAL",
        }
    }

    pub fn to_error_body(&self, message: impl Into<String>) -> ErrorBody {
        ErrorBody { code: self.as_str().to_owned(), message: message.into() }
    }

    pub fn to_http_response(
        &self,
        message: impl Into<String>,
    ) -> (StatusCode, Json<ErrorResponse>) {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse { error: self.to_error_body(message) };
        (status, Json(body))
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error body with machine-readable code and human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
