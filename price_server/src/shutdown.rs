//! Process-wide shutdown signal.
//!
//! The signal is a crossbeam channel that never carries a message: triggering
//! it drops the only sender, which disconnects every receiver at once. Worker
//! loops can therefore put `signal.receiver()` into a `select!` next to their
//! regular work, or poll `is_triggered()` between blocking reads.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::time::Duration;

/// Owner side of the shutdown signal. Dropping or triggering it fires the signal.
pub struct ShutdownHandle {
    _tx: Sender<()>,
}

impl ShutdownHandle {
    /// Fire the signal for every clone of the paired `ShutdownSignal`.
    pub fn trigger(self) {}
}

/// Observer side of the shutdown signal, cheap to clone into every thread.
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: Receiver<()>,
}

/// Create a connected handle/signal pair.
pub fn channel() -> (ShutdownHandle, ShutdownSignal) {
    let (tx, rx) = bounded::<()>(0);
    (ShutdownHandle { _tx: tx }, ShutdownSignal { rx })
}

impl ShutdownSignal {
    /// Non-blocking check.
    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Block for at most `timeout`; returns `true` if the signal fired meanwhile.
    pub fn wait(&self, timeout: Duration) -> bool {
        matches!(
            self.rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Receiver to use inside `crossbeam_channel::select!`; it becomes ready once triggered.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_reaches_every_clone() {
        let (handle, signal) = channel();
        let other = signal.clone();
        assert!(!signal.is_triggered());
        assert!(!other.wait(Duration::from_millis(5)));

        handle.trigger();
        assert!(signal.is_triggered());
        assert!(other.wait(Duration::from_secs(1)));
    }
}
