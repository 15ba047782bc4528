//! Live price feed server.
//!
//! A fixed catalog of instruments is mutated on a fixed cadence and every
//! mutation is pushed to all connected WebSocket clients. The building blocks:
//!
//! - `model::store::PriceStore`: authoritative prices behind one lock.
//! - `model::simulator::PriceSimulator`: periodic random walk producing snapshots.
//! - `model::registry::SubscriberRegistry`: live subscribers.
//! - `broadcaster::Broadcaster`: single consumer fanning snapshots out with
//!   bounded writes and failure isolation.
//! - `lifecycle::ConnectionLifecycle`: initial snapshot, registration and
//!   removal of one connection.
//! - `listener::FeedListener` and `connection::WsConnection`: the WebSocket
//!   transport in front of the core.
//!
//! Threads only share the store, the registry and the snapshot queue. All of
//! them observe a common `shutdown::ShutdownSignal`.
#![warn(missing_docs)]
pub mod args;
pub mod broadcaster;
pub mod config;
pub mod connection;
pub mod lifecycle;
pub mod listener;
pub mod model;
pub mod server;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ServerConfig;
pub use server::FeedServer;
