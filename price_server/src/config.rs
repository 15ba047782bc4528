//! Runtime configuration of the price server.

use crate::args::Args;
use price_common::net::{FEED_PORT, addr};
use price_common::{FeedError, Result};
use std::time::Duration;

/// Settings shared by the listener, simulator and broadcaster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listener address, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// Cadence of the price simulator.
    pub tick_interval: Duration,
    /// Upper bound for one write to one subscriber.
    pub write_timeout: Duration,
    /// Socket read timeout used by connection threads between shutdown checks.
    pub read_poll_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: addr("0.0.0.0", FEED_PORT),
            tick_interval: Duration::from_secs(3),
            write_timeout: Duration::from_secs(1),
            read_poll_interval: Duration::from_millis(100),
        }
    }
}

fn positive_millis(name: &str, value: u64) -> Result<Duration> {
    if value == 0 {
        return Err(FeedError::Format(format!("--{} must be greater than zero", name)));
    }
    Ok(Duration::from_millis(value))
}

impl TryFrom<Args> for ServerConfig {
    type Error = FeedError;

    fn try_from(args: Args) -> Result<Self> {
        Ok(Self {
            bind_addr: args.bind,
            tick_interval: positive_millis("tick-interval-ms", args.tick_interval_ms)?,
            write_timeout: positive_millis("write-timeout-ms", args.write_timeout_ms)?,
            read_poll_interval: positive_millis("read-poll-ms", args.read_poll_ms)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_defaults_match_default_config() {
        let args = Args::parse_from(["price_server"]);
        assert_eq!(ServerConfig::try_from(args).unwrap(), ServerConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let args = Args::parse_from([
            "price_server",
            "--bind",
            "127.0.0.1:9000",
            "--tick-interval-ms",
            "250",
            "--write-timeout-ms",
            "40",
        ]);
        let config = ServerConfig::try_from(args).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.write_timeout, Duration::from_millis(40));
    }

    #[test]
    fn zero_durations_are_rejected() {
        let args = Args::parse_from(["price_server", "--write-timeout-ms", "0"]);
        assert!(matches!(ServerConfig::try_from(args), Err(FeedError::Format(_))));
    }
}
