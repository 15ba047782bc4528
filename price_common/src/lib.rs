//!
//! Common types and utilities shared by the price server and client.
//!
//! This crate aggregates:
//! - `error`: unified error type `FeedError` used across the workspace.
//! - `result`: handy `Result<T, FeedError>` alias.
//! - `tickers`: the seeded instrument catalog shared by both sides.
//! - `snapshot`: `Instrument` and the `MutationSnapshot` wire message.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod error;
pub mod net;
pub mod result;
pub mod snapshot;
pub mod tickers;

pub use error::FeedError;
pub use result::Result;
pub use snapshot::{Instrument, MessageKind, MutationSnapshot};
pub use tickers::Ticker;
