//! Command-line arguments for the price server.
//!
//! This module defines the CLI interface using `clap`. See `config` for how the
//! values are validated and turned into a `ServerConfig`.
use clap::Parser;
use price_common::net::{FEED_PORT, addr};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Address the WebSocket listener binds to.
    #[arg(long, default_value_t = addr("0.0.0.0", FEED_PORT))]
    pub bind: String,

    /// Interval between two price ticks, in milliseconds.
    #[arg(long, default_value_t = 3000)]
    pub tick_interval_ms: u64,

    /// Longest a single write to a subscriber may take, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub write_timeout_ms: u64,

    /// How often connection threads wake up to check for shutdown, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub read_poll_ms: u64,
}
