//! In-memory `Connection` used by unit tests.

use crate::connection::{Connection, Inbound};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use price_common::{FeedError, MutationSnapshot, Result};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(10);

type SendHook = Box<dyn Fn() + Send>;

pub(crate) struct MockConnection {
    name: String,
    sent: Mutex<Vec<String>>,
    fail_writes: AtomicBool,
    stall_writes: AtomicBool,
    closed: AtomicBool,
    on_send: Mutex<Option<SendHook>>,
    inbound_tx: Sender<Inbound>,
    inbound_rx: Receiver<Inbound>,
}

impl MockConnection {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        let (inbound_tx, inbound_rx) = unbounded();
        Arc::new(Self {
            name: name.to_string(),
            sent: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            stall_writes: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            on_send: Mutex::new(None),
            inbound_tx,
            inbound_rx,
        })
    }

    /// Every later write fails as if the peer reset the socket.
    pub(crate) fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Every later write blocks until its timeout expires.
    pub(crate) fn stall_writes(&self) {
        self.stall_writes.store(true, Ordering::SeqCst);
    }

    /// Run `hook` at the start of every later write.
    pub(crate) fn on_send(&self, hook: impl Fn() + Send + 'static) {
        *self.on_send.lock().unwrap() = Some(Box::new(hook));
    }

    /// Simulate the client sending a frame.
    pub(crate) fn push_frame(&self) {
        let _ = self.inbound_tx.send(Inbound::Frame);
    }

    /// Simulate the client closing its side.
    pub(crate) fn hang_up(&self) {
        let _ = self.inbound_tx.send(Inbound::Closed);
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn messages(&self) -> Vec<MutationSnapshot> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|text| MutationSnapshot::from_json(text).unwrap())
            .collect()
    }
}

impl Connection for MockConnection {
    fn peer(&self) -> String {
        self.name.clone()
    }

    fn send(&self, payload: &str, timeout: Duration) -> Result<()> {
        if let Some(hook) = self.on_send.lock()?.as_ref() {
            hook();
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(FeedError::ConnectionClosed);
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        }
        if self.stall_writes.load(Ordering::SeqCst) {
            thread::sleep(timeout);
            return Err(FeedError::WriteTimeout(timeout));
        }
        self.sent.lock()?.push(payload.to_string());
        Ok(())
    }

    fn recv(&self) -> Result<Inbound> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(Inbound::Closed);
        }
        match self.inbound_rx.recv_timeout(POLL) {
            Ok(inbound) => Ok(inbound),
            Err(RecvTimeoutError::Timeout) => Ok(Inbound::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(Inbound::Closed),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
