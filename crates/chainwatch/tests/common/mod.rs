//! Shared test support: a scripted mock chain and polling helpers.
#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use chainwatch::{Chain, Error, Log, Query, Subscription};

/// A chain driver with a scripted head and log set.
pub struct MockChain {
    id: String,
    latest: AtomicU64,
    logs: Mutex<Vec<Log>>,
    fetch_calls: Mutex<Vec<(u64, u64)>>,
    failures_left: AtomicU32,
    armed: Mutex<Option<Subscription>>,
}

impl MockChain {
    pub fn new(id: &str, latest: u64) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            latest: AtomicU64::new(latest),
            logs: Mutex::new(Vec::new()),
            fetch_calls: Mutex::new(Vec::new()),
            failures_left: AtomicU32::new(0),
            armed: Mutex::new(None),
        })
    }

    pub fn set_latest(&self, block: u64) {
        self.latest.store(block, Ordering::SeqCst);
    }

    pub fn push(&self, log: Log) {
        self.logs.lock().unwrap().push(log);
    }

    /// Ranges passed to `fetch_logs`, in call order.
    pub fn fetch_calls(&self) -> Vec<(u64, u64)> {
        self.fetch_calls.lock().unwrap().clone()
    }

    /// Makes the next `n` `fetch_logs` calls fail.
    pub fn fail_next_fetches(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// Provides the subscription handed out by the next `subscribe`.
    pub fn arm_subscription(&self, sub: Subscription) {
        *self.armed.lock().unwrap() = Some(sub);
    }
}

#[async_trait]
impl Chain for MockChain {
    fn id(&self) -> &str {
        &self.id
    }

    async fn latest_block(&self) -> Result<u64, Error> {
        Ok(self.latest.load(Ordering::SeqCst))
    }

    async fn fetch_logs(&self, query: &Query) -> Result<Vec<Log>, Error> {
        let from = query.from_block.unwrap_or(0);
        let to = query.to_block.unwrap_or(u64::MAX);
        self.fetch_calls.lock().unwrap().push((from, to));

        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Connection("injected failure".into()));
        }

        let mut logs: Vec<Log> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.block_number >= from && l.block_number <= to)
            .cloned()
            .collect();
        logs.sort_by_key(|l| (l.block_number, l.log_index));
        Ok(logs)
    }

    async fn subscribe(&self, _query: &Query) -> Result<Subscription, Error> {
        self.armed
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| Error::Connection("subscriptions unsupported".into()))
    }
}

/// A plain log at the given position.
pub fn log_at(chain: &str, block: u64, log_index: u32) -> Log {
    Log {
        chain: chain.to_string(),
        block_number: block,
        log_index,
        ..Default::default()
    }
}

/// Polls `condition` until it holds or a 5 second deadline passes.
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if condition().await {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
