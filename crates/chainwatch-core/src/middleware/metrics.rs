//! Counting middleware.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{Handler, Middleware};

/// Counts events that reach the inner handler versus events dropped by
/// it (or by middleware wrapped inside this one).
///
/// Clones share the same counters, so the caller can keep one handle
/// and read the totals while the pipeline runs.
#[derive(Debug, Clone, Default)]
pub struct Metrics {
    processed: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events the inner pipeline processed.
    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Number of events the inner pipeline dropped.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Middleware for Metrics {
    fn wrap(&self, next: Handler) -> Handler {
        let processed = Arc::clone(&self.processed);
        let dropped = Arc::clone(&self.dropped);
        Box::new(move |log| {
            let result = next(log);
            if result.is_some() {
                processed.fetch_add(1, Ordering::Relaxed);
            } else {
                dropped.fetch_add(1, Ordering::Relaxed);
            }
            result
        })
    }
}
