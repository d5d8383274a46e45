//! Rate-limiting middleware.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::{Handler, Middleware};

/// Admits at most one event per interval; events arriving sooner are
/// dropped, never queued.
#[derive(Debug, Clone)]
pub struct RateLimit {
    interval: Duration,
    last: Arc<Mutex<Option<Instant>>>,
}

impl RateLimit {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Arc::new(Mutex::new(None)),
        }
    }
}

impl Middleware for RateLimit {
    fn wrap(&self, next: Handler) -> Handler {
        let interval = self.interval;
        let last = Arc::clone(&self.last);
        Box::new(move |log| {
            {
                let mut last = last.lock().unwrap();
                if last.is_some_and(|t| t.elapsed() < interval) {
                    return None;
                }
                *last = Some(Instant::now());
            }
            next(log)
        })
    }
}
