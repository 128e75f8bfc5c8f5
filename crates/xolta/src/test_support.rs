// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: scripted HTTP servers and builders.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;

use crate::config::Tuning;

static CRYPTO: Once = Once::new();

/// Install the rustls crypto provider (needed for reqwest even on plain HTTP).
pub fn ensure_crypto_provider() {
    CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// A reqwest client usable in tests.
pub fn http_client() -> reqwest::Client {
    ensure_crypto_provider();
    reqwest::Client::new()
}

/// A request as seen by a [`MockServer`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: String,
    pub query: String,
    pub body: String,
    pub authorization: Option<String>,
}

impl Recorded {
    /// Value of a query parameter, if present.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then(|| v.replace("%3A", ":"))
        })
    }
}

struct Route {
    responses: Vec<(u16, String)>,
    hits: AtomicU32,
    delay: Option<Duration>,
}

#[derive(Default)]
struct MockState {
    routes: HashMap<String, Route>,
    log: Mutex<Vec<Recorded>>,
    delay: Option<Duration>,
}

/// HTTP server replaying scripted `(status, body)` responses per path.
///
/// Responses are served in order; once exhausted the last one repeats.
/// Unknown paths answer 404.
pub struct MockServer {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockServer {
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Number of requests received for a path.
    pub fn hits(&self, path: &str) -> u32 {
        self.state.routes.get(path).map(|r| r.hits.load(Ordering::SeqCst)).unwrap_or(0)
    }

    /// Recorded requests for a path, oldest first.
    pub fn requests(&self, path: &str) -> Vec<Recorded> {
        match self.state.log.lock() {
            Ok(log) => log.iter().filter(|r| r.path == path).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct MockServerBuilder {
    routes: HashMap<String, Vec<(u16, String)>>,
    route_delays: HashMap<String, Duration>,
    delay: Option<Duration>,
}

impl MockServerBuilder {
    /// Script the responses for `path`.
    pub fn route(mut self, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.routes.insert(path.to_owned(), responses);
        self
    }

    /// Delay every response.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay responses for `path` only.
    pub fn delay_route(mut self, path: &str, delay: Duration) -> Self {
        self.route_delays.insert(path.to_owned(), delay);
        self
    }

    pub async fn start(self) -> anyhow::Result<MockServer> {
        let route_delays = self.route_delays;
        let routes = self
            .routes
            .into_iter()
            .map(|(path, responses)| {
                let delay = route_delays.get(&path).copied();
                (path, Route { responses, hits: AtomicU32::new(0), delay })
            })
            .collect();
        let state = Arc::new(MockState { routes, log: Mutex::new(Vec::new()), delay: self.delay });

        let app = Router::new().fallback(respond).with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(MockServer { addr, state })
    }
}

async fn respond(
    State(state): State<Arc<MockState>>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let path = uri.path().to_owned();
    if let Ok(mut log) = state.log.lock() {
        log.push(Recorded {
            path: path.clone(),
            query: uri.query().unwrap_or_default().to_owned(),
            body,
            authorization: headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        });
    }
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let Some(route) = state.routes.get(&path) else {
        return (StatusCode::NOT_FOUND, "{}".to_owned());
    };
    if let Some(delay) = route.delay {
        tokio::time::sleep(delay).await;
    }
    let idx = route.hits.fetch_add(1, Ordering::SeqCst) as usize;
    let (status, body) = route
        .responses
        .get(idx)
        .or_else(|| route.responses.last())
        .cloned()
        .unwrap_or((500, "{}".to_owned()));
    (StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), body)
}

/// Token endpoint success body.
pub fn token_body(access: &str, refresh: &str) -> String {
    serde_json::json!({ "access_token": access, "refresh_token": refresh, "expires_in": 3600 })
        .to_string()
}

/// `siteStatus` body for a running site.
pub fn status_body(state: &str, battery_kw: f64, pv_kw: f64) -> String {
    serde_json::json!({
        "data": [{
            "state": state,
            "inverterActivePowerAggAvg": battery_kw,
            "meterPvActivePowerAggAvg": pv_kw,
            "consumption": 0.8,
            "bmsSocRawArrayCloudTrimmedAggAvg": 76.0,
            "meterGridActivePowerAggAvg": 0.3,
        }]
    })
    .to_string()
}

/// `GetDataSummary` body with no buckets (window end defaults to "now").
pub fn empty_summary_body() -> String {
    serde_json::json!({ "telemetry": [] }).to_string()
}

/// Tuning with short timeouts suitable for tests.
pub fn test_tuning() -> Tuning {
    Tuning {
        request_timeout: Duration::from_secs(5),
        login_timeout: Duration::from_secs(5),
        token_retries: 2,
        energy_refresh: Duration::from_secs(600),
        resolution_mins: 10,
    }
}
