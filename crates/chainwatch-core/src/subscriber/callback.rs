//! Callback-based subscriber.

use std::sync::atomic::{AtomicBool, Ordering};

use super::Subscriber;
use crate::event::Log;

/// Invokes a function synchronously on the sender's task for every log.
pub struct Callback {
    f: Box<dyn Fn(Log) + Send + Sync>,
    closed: AtomicBool,
}

impl Callback {
    pub fn new(f: impl Fn(Log) + Send + Sync + 'static) -> Self {
        Self {
            f: Box::new(f),
            closed: AtomicBool::new(false),
        }
    }
}

impl Subscriber for Callback {
    fn send(&self, log: Log) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        (self.f)(log);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
