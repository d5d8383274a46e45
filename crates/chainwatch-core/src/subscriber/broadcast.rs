//! Broadcast fan-out to multiple subscribers.

use std::sync::{Arc, RwLock};

use super::Subscriber;
use crate::event::Log;

/// Distributes every log to all registered subscribers.
///
/// `send` runs under a read lock (the hot path); `add` and `close` take
/// the write lock.
#[derive(Default)]
pub struct Broadcast {
    subscribers: RwLock<Vec<Arc<dyn Subscriber>>>,
}

impl Broadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber.
    pub fn add(&self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.write().unwrap().push(subscriber);
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Subscriber for Broadcast {
    fn send(&self, log: Log) {
        for sub in self.subscribers.read().unwrap().iter() {
            sub.send(log.clone());
        }
    }

    fn close(&self) {
        let mut subscribers = self.subscribers.write().unwrap();
        for sub in subscribers.iter() {
            sub.close();
        }
        subscribers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::{Callback, Channel};
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn fans_out_with_independent_backpressure() {
        let broadcast = Broadcast::new();

        let (channel, mut rx) = Channel::new(1);
        broadcast.add(Arc::new(channel));

        let callback_count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&callback_count);
        broadcast.add(Arc::new(Callback::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })));

        // Two rapid sends: the callback sees both, the size-1 channel
        // keeps the first and silently drops the second.
        broadcast.send(Log {
            block_number: 1,
            ..Default::default()
        });
        broadcast.send(Log {
            block_number: 2,
            ..Default::default()
        });

        assert_eq!(callback_count.load(Ordering::SeqCst), 2);
        assert_eq!(rx.recv().await.unwrap().block_number, 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn close_clears_subscribers() {
        let broadcast = Broadcast::new();
        broadcast.add(Arc::new(Callback::new(|_| {})));
        assert_eq!(broadcast.len(), 1);

        broadcast.close();
        assert!(broadcast.is_empty());
    }
}
