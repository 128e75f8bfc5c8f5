// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use xolta_batt::config::{Command, Config};
use xolta_batt::sensor;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("error: {e:#}");
        std::process::exit(2);
    }
    init_tracing(&config);

    // reqwest is built without a default crypto provider.
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        error!("failed to install rustls crypto provider");
        std::process::exit(1);
    }

    let code = match dispatch(config).await {
        Ok(code) => code,
        Err(e) => {
            error!("fatal: {e:#}");
            1
        }
    };
    std::process::exit(code);
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so `fetch` output stays clean JSON.
    match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init(),
        _ => fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init(),
    }
}

async fn dispatch(config: Config) -> anyhow::Result<i32> {
    match config.command() {
        Command::Run => {
            let shutdown = CancellationToken::new();
            spawn_signal_handler(shutdown.clone());
            xolta_batt::run(config, shutdown).await?;
            Ok(0)
        }
        Command::Fetch { sensors } => {
            let services = xolta_batt::build_services(&config)?;
            let result = services.fetcher.fetch().await?;
            let out = if sensors {
                serde_json::to_string_pretty(&sensor::project(&result))?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{out}");
            Ok(0)
        }
        Command::Check => {
            let services = xolta_batt::build_services(&config)?;
            match services.broker.check().await {
                Ok(()) => {
                    info!(account = services.broker.account().identifier(), "credentials ok");
                    Ok(0)
                }
                Err(e) => {
                    error!(kind = %e.kind(), "credential check failed: {e}");
                    Ok(1)
                }
            }
        }
    }
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        let mut sigint =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()).ok();

        tokio::select! {
            _ = async {
                if let Some(ref mut s) = sigterm { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGTERM");
            }
            _ = async {
                if let Some(ref mut s) = sigint { s.recv().await } else { std::future::pending().await }
            } => {
                info!("received SIGINT");
            }
        }
        shutdown.cancel();
    });
}
