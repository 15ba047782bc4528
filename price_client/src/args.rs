//! Command-line arguments for the Price Client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use price_common::Ticker;
use price_common::net::{FEED_PORT, feed_url};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// WebSocket URL of the price feed.
    #[arg(long, default_value_t = feed_url("127.0.0.1", FEED_PORT))]
    pub server: String,

    /// Only print these tickers (repeatable). Prints every ticker when omitted.
    #[arg(long = "ticker", value_enum)]
    pub tickers: Vec<Ticker>,
}
