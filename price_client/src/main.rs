//! Price Client: subscribes to the WebSocket price feed and logs every
//! `initial` and `update` message it receives, optionally filtered to a set of
//! tickers.
//!
//! Usage example (CLI):
//! ```bash
//! price_client --server ws://192.168.0.10:8080/ws --ticker aapl --ticker tcs
//! ```
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use chrono::Local;
use clap::Parser;
use log::{debug, error, info};
use price_common::{FeedError, MutationSnapshot, Result, Ticker};
use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

/// How often the receive loop wakes up to check for Ctrl+C.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

type FeedSocket = WebSocket<MaybeTlsStream<TcpStream>>;

/// Log one snapshot, limited to `filter` when it is not empty.
fn print_snapshot(snapshot: &MutationSnapshot, filter: &[Ticker]) {
    let received_at = Local::now().format("%H:%M:%S%.3f");
    info!("{:?} prices received at {}", snapshot.kind, received_at);
    for instrument in snapshot.prices.values() {
        if filter.is_empty() || filter.contains(&instrument.symbol) {
            info!(
                "  {:<5} Price={:.2} Change={:.3}%",
                instrument.symbol, instrument.price, instrument.change_percent
            );
        }
    }
}

/// Runs a blocking loop that receives price messages from `socket` and prints
/// them. Returns an error if the connection fails.
fn start_receiver_loop(
    socket: &mut FeedSocket,
    filter: &[Ticker],
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    while !shutdown.load(Ordering::Relaxed) {
        match socket.read() {
            Ok(Message::Text(text)) => match MutationSnapshot::from_json(text.as_str()) {
                Ok(snapshot) => print_snapshot(&snapshot, filter),
                Err(_) => debug!("Received non-price message: {}", text.as_str()),
            },
            Ok(Message::Close(_)) => {
                info!("Server closed the feed");
                return Ok(());
            }
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => {
                error!("Receive data error: {}", e);
                return Err(FeedError::WebSocket(e));
            }
        }
    }
    info!("Receiver loop stopping...");
    if let Err(e) = socket.close(None) {
        debug!("Close handshake failed: {}", e);
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| FeedError::Format(format!("Failed to install Ctrl+C handler: {}", e)))?;
    }

    info!("Connecting to price feed at {}", args.server);
    let (mut socket, _) = tungstenite::connect(args.server.as_str())?;
    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
    }
    if !args.tickers.is_empty() {
        info!("Tickers: {:?}", args.tickers);
    }

    info!("Client is running. Press Ctrl+C to exit.");
    start_receiver_loop(&mut socket, &args.tickers, shutdown)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
