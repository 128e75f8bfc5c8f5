// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::api::client::DEFAULT_API_BASE_URL;
use crate::credential::oauth::DEFAULT_TOKEN_URL;
use crate::credential::Account;

const MINUTES_PER_DAY: u64 = 24 * 60;

/// How interactive logins are performed when the refresh token is unusable.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LoginBridgeMode {
    /// No interactive login; an expired refresh token needs reconfiguration.
    #[default]
    None,
    /// POST login requests to `--login-bridge-url`.
    Http,
    /// Queue login requests for a worker polling `/api/v1/login/next`.
    Worker,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Poll on an interval and serve the latest readings (default).
    Run,
    /// Run a single fetch cycle and print the result as JSON.
    Fetch {
        /// Print sensor readings instead of the raw fetch result.
        #[arg(long)]
        sensors: bool,
    },
    /// Validate the configured credentials and exit.
    Check,
}

/// Xolta battery telemetry bridge.
#[derive(Debug, Parser)]
#[command(name = "xolta-batt", version, about)]
pub struct Config {
    /// Xolta account username (interactive login mode).
    #[arg(long, env = "XOLTA_USERNAME")]
    pub username: Option<String>,

    /// Xolta account password (interactive login mode).
    #[arg(long, env = "XOLTA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Site id (refresh-token mode).
    #[arg(long, env = "XOLTA_SITE_ID")]
    pub site_id: Option<String>,

    /// Initial refresh token (refresh-token mode).
    #[arg(long, env = "XOLTA_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    /// Directory for persisted credentials.
    #[arg(long, env = "XOLTA_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Seconds between fetch cycles.
    #[arg(long, default_value_t = 60, env = "XOLTA_POLL_INTERVAL_SECS")]
    pub poll_interval_secs: u64,

    /// Timeout for vendor REST and token calls, in seconds.
    #[arg(long, default_value_t = 20, env = "XOLTA_REQUEST_TIMEOUT_SECS")]
    pub request_timeout_secs: u64,

    /// Timeout for one interactive login round-trip, in seconds.
    #[arg(long, default_value_t = 30, env = "XOLTA_LOGIN_TIMEOUT_SECS")]
    pub login_timeout_secs: u64,

    /// Token renewals allowed per fetch cycle after 401 responses.
    #[arg(long, default_value_t = 2, env = "XOLTA_TOKEN_RETRIES")]
    pub token_retries: u32,

    /// Minimum minutes between energy summary queries per site.
    #[arg(long, default_value_t = 10, env = "XOLTA_ENERGY_REFRESH_MINS")]
    pub energy_refresh_mins: u64,

    /// Bucket size of energy summary queries, in minutes.
    #[arg(long, default_value_t = 10, env = "XOLTA_RESOLUTION_MINS")]
    pub resolution_mins: u32,

    /// Interactive login bridge.
    #[arg(long, value_enum, default_value_t = LoginBridgeMode::None, env = "XOLTA_LOGIN_BRIDGE")]
    pub login_bridge: LoginBridgeMode,

    /// Login service URL for `--login-bridge http`.
    #[arg(long, env = "XOLTA_LOGIN_BRIDGE_URL")]
    pub login_bridge_url: Option<String>,

    #[arg(long, hide = true, default_value = DEFAULT_TOKEN_URL, env = "XOLTA_TOKEN_URL")]
    pub token_url: String,

    #[arg(long, hide = true, default_value = DEFAULT_API_BASE_URL, env = "XOLTA_API_BASE_URL")]
    pub api_base_url: String,

    /// Host to bind the read API on.
    #[arg(long, default_value = "127.0.0.1", env = "XOLTA_HOST")]
    pub host: String,

    /// Port for the read API.
    #[arg(long, default_value_t = 9810, env = "XOLTA_PORT")]
    pub port: u16,

    /// Bearer token for the read API. If unset, auth is disabled.
    #[arg(long, env = "XOLTA_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Log filter directive.
    #[arg(long, default_value = "info", env = "XOLTA_LOG")]
    pub log_level: String,

    /// Log format: `text` or `json`.
    #[arg(long, default_value = "text", env = "XOLTA_LOG_FORMAT")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Timing and budget knobs shared by the broker and fetcher.
#[derive(Debug, Clone)]
pub struct Tuning {
    pub request_timeout: Duration,
    pub login_timeout: Duration,
    pub token_retries: u32,
    pub energy_refresh: Duration,
    pub resolution_mins: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(20),
            login_timeout: Duration::from_secs(30),
            token_retries: 2,
            energy_refresh: Duration::from_secs(600),
            resolution_mins: 10,
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.account()?;

        if self.login_bridge == LoginBridgeMode::Http && self.login_bridge_url.is_none() {
            anyhow::bail!("--login-bridge http requires --login-bridge-url");
        }
        if self.login_bridge != LoginBridgeMode::None && self.username.is_none() {
            anyhow::bail!("an interactive login bridge needs --username and --password");
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("--poll-interval-secs must be positive");
        }
        if self.resolution_mins == 0 || self.energy_refresh_mins == 0 {
            anyhow::bail!("--resolution-mins and --energy-refresh-mins must be positive");
        }
        // The energy window resets at midnight.
        if self.energy_refresh_mins > MINUTES_PER_DAY
            || u64::from(self.resolution_mins) > MINUTES_PER_DAY
        {
            anyhow::bail!("--resolution-mins and --energy-refresh-mins must not exceed one day");
        }
        if !matches!(self.log_format.as_str(), "text" | "json") {
            anyhow::bail!("invalid log format: {}", self.log_format);
        }
        Ok(())
    }

    /// Resolve the account mode from the credential flags.
    pub fn account(&self) -> anyhow::Result<Account> {
        match (&self.username, &self.password, &self.site_id, &self.refresh_token) {
            (Some(username), Some(password), None, None) => {
                Ok(Account::Password { username: username.clone(), password: password.clone() })
            }
            (None, None, Some(site_id), Some(refresh_token)) => Ok(Account::RefreshToken {
                site_id: site_id.clone(),
                refresh_token: refresh_token.clone(),
            }),
            (Some(_), None, _, _) | (None, Some(_), _, _) => {
                anyhow::bail!("--username and --password must be given together")
            }
            (None, None, Some(_), None) | (None, None, None, Some(_)) => {
                anyhow::bail!("--site-id and --refresh-token must be given together")
            }
            (None, None, None, None) => {
                anyhow::bail!("either --username/--password or --site-id/--refresh-token is required")
            }
            _ => anyhow::bail!("cannot combine username/password with site-id/refresh-token"),
        }
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(crate::credential::default_state_dir)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn tuning(&self) -> Tuning {
        Tuning {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            login_timeout: Duration::from_secs(self.login_timeout_secs),
            token_retries: self.token_retries,
            energy_refresh: Duration::from_secs(self.energy_refresh_mins.saturating_mul(60)),
            resolution_mins: self.resolution_mins,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
