//! Channel-based subscriber.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use super::Subscriber;
use crate::event::Log;

/// Buffer size used when a capacity of 0 is requested.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// Delivers logs through a bounded channel.
///
/// `send` never blocks: when the buffer is full the log is dropped
/// silently. This is the documented delivery contract for subscribers
/// that cannot keep up.
pub struct Channel {
    tx: mpsc::Sender<Log>,
    closed: AtomicBool,
}

impl Channel {
    /// Creates the subscriber and the receiving half. A capacity of 0
    /// falls back to [`DEFAULT_CHANNEL_CAPACITY`].
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Log>) {
        let capacity = if capacity == 0 {
            DEFAULT_CHANNEL_CAPACITY
        } else {
            capacity
        };
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                closed: AtomicBool::new(false),
            },
            rx,
        )
    }
}

impl Subscriber for Channel {
    fn send(&self, log: Log) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        // Full or disconnected buffers drop the log.
        let _ = self.tx.try_send(log);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
