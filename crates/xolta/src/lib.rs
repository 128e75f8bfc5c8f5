// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Xolta battery telemetry: token lifecycle, fetch cycle, and a read API.

pub mod api;
pub mod config;
pub mod credential;
pub mod error;
pub mod login;
pub mod poller;
pub mod sensor;
pub mod state;
pub mod telemetry;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api::client::XoltaClient;
use crate::config::{Config, LoginBridgeMode};
use crate::credential::broker::TokenBroker;
use crate::credential::store::FileStore;
use crate::login::http::HttpLoginBridge;
use crate::login::worker::WorkerBridge;
use crate::poller::{PollState, Poller};
use crate::state::AppState;
use crate::telemetry::fetcher::TelemetryFetcher;
use crate::transport::build_router;

/// The per-account object graph: one broker, one fetcher.
pub struct Services {
    pub broker: Arc<TokenBroker>,
    pub fetcher: Arc<TelemetryFetcher>,
    pub worker: Option<Arc<WorkerBridge>>,
}

/// Wire up broker, store, login bridge, and fetcher from `config`.
pub fn build_services(config: &Config) -> anyhow::Result<Services> {
    let account = config.account()?;
    let tuning = config.tuning();
    let http = reqwest::Client::builder().build()?;

    let state_dir = config.state_dir();
    tracing::debug!(state_dir = %state_dir.display(), account = ?account, "credential store");
    let mut broker = TokenBroker::new(account, http.clone(), config.token_url.clone())
        .with_store(Arc::new(FileStore::new(state_dir)))
        .with_tuning(tuning.clone());

    let mut worker = None;
    match config.login_bridge {
        LoginBridgeMode::None => {}
        LoginBridgeMode::Http => {
            let url = config
                .login_bridge_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--login-bridge http requires --login-bridge-url"))?;
            broker = broker.with_login_bridge(Arc::new(HttpLoginBridge::new(url, http.clone())));
        }
        LoginBridgeMode::Worker => {
            let bridge = Arc::new(WorkerBridge::new());
            broker = broker.with_login_bridge(Arc::clone(&bridge) as _);
            worker = Some(bridge);
        }
    }

    let broker = Arc::new(broker);
    let client = XoltaClient::new(config.api_base_url.clone(), http, tuning.request_timeout);
    let fetcher = Arc::new(TelemetryFetcher::new(Arc::clone(&broker), client, tuning));
    Ok(Services { broker, fetcher, worker })
}

/// Poll and serve the read API until shutdown.
pub async fn run(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let services = build_services(&config)?;

    let poll = Arc::new(PollState::new());
    let poller = Poller::new(Arc::clone(&services.fetcher), Arc::clone(&poll), config.poll_interval());

    let mut app = AppState::new(poll, Arc::clone(&services.broker), shutdown.clone())
        .with_auth_token(config.auth_token.clone());
    if let Some(worker) = services.worker {
        app = app.with_worker(worker);
    }
    let router = build_router(Arc::new(app));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        account = config.account()?.identifier(),
        login_bridge = ?config.login_bridge,
        "xolta-batt listening on {addr}"
    );

    let poll_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { poller.run(shutdown).await })
    };

    axum::serve(listener, router).with_graceful_shutdown(shutdown.clone().cancelled_owned()).await?;
    shutdown.cancel();
    poll_task.await?;
    Ok(())
}
