//! Error types shared between client and server.
//!
//! The `FeedError` enum unifies the failure cases of the feed: socket and
//! WebSocket I/O, JSON encoding, channel communication, lock poisoning and the
//! numeric faults a price mutation can hit. Crates propagate this single type
//! with `?`.
use std::io;
use std::sync::PoisonError;
use std::time::Duration;

use thiserror::Error;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum FeedError {
    /// I/O error originating from the standard library or sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// WebSocket protocol or transport failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Crossbeam/channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Crossbeam/channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),

    /// Arithmetic in a price mutation overflowed or produced an invalid price.
    #[error("Numeric fault: {0}")]
    NumericFault(String),

    /// A write to a subscriber did not complete within the allowed time.
    #[error("Write timed out after {0:?}")]
    WriteTimeout(Duration),

    /// The peer has already closed the connection.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl<T> From<PoisonError<T>> for FeedError {
    fn from(err: PoisonError<T>) -> Self {
        FeedError::MutexLock(err.to_string())
    }
}
