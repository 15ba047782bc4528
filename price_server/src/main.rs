//! Price feed server binary.
//!
//! Binds the WebSocket listener, starts the price simulator and broadcaster,
//! and serves subscribers until Ctrl+C.
//!
//! ```bash
//! RUST_LOG=debug price_server --bind 0.0.0.0:8080 --tick-interval-ms 3000
//! ```
use clap::Parser;
use log::info;
use price_common::{FeedError, Result};
use price_server::args::Args;
use price_server::{FeedServer, ServerConfig, shutdown};

fn main() -> Result<()> {
    init_logger();
    let config = ServerConfig::try_from(Args::parse())?;
    info!("Starting price feed with {:?}", config);

    let (handle, signal) = shutdown::channel();
    let mut handle = Some(handle);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down price feed...");
        if let Some(handle) = handle.take() {
            handle.trigger();
        }
    })
    .map_err(|e| FeedError::Format(format!("Failed to install Ctrl+C handler: {}", e)))?;

    FeedServer::bind(config)?.run(signal)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
