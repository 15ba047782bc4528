//! Fan-out of price snapshots to every subscriber.
//!
//! The `Broadcaster` is the single consumer of the snapshot queue. Each
//! snapshot is encoded once and written directly to every subscriber that is
//! registered when the pass starts, in queue order.
//!
//! Failure handling:
//! - Every write is bounded by the configured write timeout; a stalled client
//!   costs at most that long and is then treated as failed.
//! - A failed write never aborts the pass. Failed subscribers are collected and
//!   removed from the registry after the pass, then their connections are
//!   closed, which also ends the owning connection thread.

use crate::model::registry::{Subscriber, SubscriberRegistry};
use crate::shutdown::ShutdownSignal;
use crossbeam_channel::{Receiver, select};
use log::{debug, error, info, warn};
use price_common::{FeedError, MutationSnapshot, Result};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Outcome of one fan-out pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
    /// Subscribers that received the snapshot.
    pub delivered: usize,
    /// Subscribers this pass removed because their write failed.
    pub dropped: usize,
}

/// Single consumer of the snapshot queue.
pub struct Broadcaster {
    registry: Arc<SubscriberRegistry>,
    write_timeout: Duration,
}

impl Broadcaster {
    /// Create a broadcaster delivering to `registry`.
    pub fn new(registry: Arc<SubscriberRegistry>, write_timeout: Duration) -> Self {
        Self {
            registry,
            write_timeout,
        }
    }

    /// Deliver `snapshot` to every current subscriber.
    ///
    /// Only an encoding failure or a poisoned registry lock is returned as an
    /// error; per-subscriber failures are reported in `FanOutReport::dropped`.
    pub fn fan_out(&self, snapshot: &MutationSnapshot) -> Result<FanOutReport> {
        let payload = snapshot.to_json()?;
        let mut report = FanOutReport::default();
        let mut failed: Vec<Subscriber> = Vec::new();

        self.registry.for_each(|subscriber| {
            match subscriber.deliver(&payload, self.write_timeout) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Delivery to {} failed: {}", subscriber.peer(), e);
                    failed.push(subscriber.clone());
                }
            }
        })?;

        for subscriber in failed {
            match self.registry.remove(&subscriber) {
                Ok(true) => {
                    info!("Subscriber {} dropped after failed delivery", subscriber.peer());
                    report.dropped += 1;
                }
                Ok(false) => debug!("Subscriber {} was already removed", subscriber.peer()),
                Err(e) => error!("Failed to remove subscriber {}: {}", subscriber.peer(), e),
            }
            subscriber.close();
        }

        Ok(report)
    }

    /// Start the consume loop on its own thread.
    ///
    /// The thread stops when `shutdown` fires or every sender of `updates`
    /// has been dropped.
    pub fn start(
        self,
        updates: Receiver<MutationSnapshot>,
        shutdown: ShutdownSignal,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            info!("Broadcaster started (write timeout {:?})", self.write_timeout);
            loop {
                select! {
                    recv(shutdown.receiver()) -> _ => break,
                    recv(updates) -> msg => match msg {
                        Ok(snapshot) => match self.fan_out(&snapshot) {
                            Ok(report) => debug!(
                                "Fan-out complete: {} delivered, {} dropped",
                                report.delivered, report.dropped
                            ),
                            Err(e) => error!("Fan-out aborted: {}", e),
                        },
                        Err(e) => {
                            info!("{}", FeedError::ChannelRecv(e.to_string()));
                            break;
                        }
                    },
                }
            }
            info!("Broadcaster stopped");
        })
    }
}
