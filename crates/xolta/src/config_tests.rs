// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use clap::Parser;

use super::*;

fn parse(args: &[&str]) -> Config {
    Config::parse_from(args)
}

#[test]
fn password_mode_with_defaults() -> anyhow::Result<()> {
    let config = parse(&["xolta-batt", "--username", "alice", "--password", "pw"]);
    config.validate()?;
    assert!(matches!(config.account()?, Account::Password { .. }));
    assert_eq!(config.poll_interval(), Duration::from_secs(60));
    assert!(matches!(config.command(), Command::Run));

    let tuning = config.tuning();
    assert_eq!(tuning.request_timeout, Duration::from_secs(20));
    assert_eq!(tuning.login_timeout, Duration::from_secs(30));
    assert_eq!(tuning.token_retries, 2);
    assert_eq!(tuning.energy_refresh, Duration::from_secs(600));
    assert_eq!(tuning.resolution_mins, 10);
    Ok(())
}

#[test]
fn refresh_token_mode() -> anyhow::Result<()> {
    let config =
        parse(&["xolta-batt", "--site-id", "s1", "--refresh-token", "rt", "fetch", "--sensors"]);
    config.validate()?;
    assert_eq!(config.account()?.pinned_site(), Some("s1"));
    assert!(matches!(config.command(), Command::Fetch { sensors: true }));
    Ok(())
}

#[yare::parameterized(
    nothing = { &["xolta-batt"] },
    half_password = { &["xolta-batt", "--username", "alice"] },
    half_refresh = { &["xolta-batt", "--site-id", "s1"] },
    mixed = { &["xolta-batt", "--username", "a", "--password", "p", "--site-id", "s1", "--refresh-token", "rt"] },
    http_without_url = { &["xolta-batt", "--username", "a", "--password", "p", "--login-bridge", "http"] },
    bridge_without_password = { &["xolta-batt", "--site-id", "s1", "--refresh-token", "rt", "--login-bridge", "worker"] },
    zero_interval = { &["xolta-batt", "--site-id", "s1", "--refresh-token", "rt", "--poll-interval-secs", "0"] },
    huge_energy_refresh = { &["xolta-batt", "--site-id", "s1", "--refresh-token", "rt", "--energy-refresh-mins", "18446744073709551615"] },
    resolution_over_a_day = { &["xolta-batt", "--site-id", "s1", "--refresh-token", "rt", "--resolution-mins", "1441"] },
    bad_log_format = { &["xolta-batt", "--site-id", "s1", "--refresh-token", "rt", "--log-format", "xml"] },
)]
fn invalid_configs_are_rejected(args: &[&str]) {
    assert!(parse(args).validate().is_err());
}

#[test]
fn http_bridge_with_url_is_valid() -> anyhow::Result<()> {
    let config = parse(&[
        "xolta-batt",
        "--username",
        "a",
        "--password",
        "p",
        "--login-bridge",
        "http",
        "--login-bridge-url",
        "http://127.0.0.1:5050/auth",
    ]);
    config.validate()?;
    assert_eq!(config.login_bridge, LoginBridgeMode::Http);
    Ok(())
}

#[test]
fn explicit_state_dir_wins() {
    let config = parse(&["xolta-batt", "--state-dir", "/tmp/xolta-state", "check"]);
    assert_eq!(config.state_dir(), std::path::PathBuf::from("/tmp/xolta-state"));
    assert!(matches!(config.command(), Command::Check));
}

#[test]
fn huge_energy_refresh_saturates() {
    let config = parse(&[
        "xolta-batt",
        "--site-id",
        "s1",
        "--refresh-token",
        "rt",
        "--energy-refresh-mins",
        "18446744073709551615",
    ]);
    assert_eq!(config.tuning().energy_refresh, Duration::from_secs(u64::MAX));
}
