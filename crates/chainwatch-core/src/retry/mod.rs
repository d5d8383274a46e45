//! Retry strategies and the circuit breaker.
//!
//! [`run`] drives a fallible async operation under a [`Strategy`];
//! the [`CircuitBreaker`] gates calls after repeated failures:
//!
//! ```text
//! Closed ──failures ≥ threshold──▶ Open ──reset timeout──▶ HalfOpen
//!   ▲                                ▲                        │
//!   └────────── probe ok ────────────┴────── probe failed ────┘
//! ```

mod backoff;
mod circuit;

pub use backoff::Backoff;
pub use circuit::{CircuitBreaker, CircuitState};

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// A retry policy: how long to wait before the given attempt, if at all.
pub trait Strategy: Send + Sync {
    /// Returns the delay before the `attempt`-th retry (1-based), or
    /// `None` once the attempt budget is exhausted.
    fn next(&self, attempt: u32) -> Option<Duration>;
}

/// Runs `op`, retrying failures according to `strategy`.
///
/// The sleep between attempts is interruptible: cancellation during the
/// wait returns [`Error::Cancelled`]. Exhausting the strategy returns
/// the last error.
pub async fn run<T, F, Fut>(
    cancel: &CancellationToken,
    strategy: &dyn Strategy,
    mut op: F,
) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0u32;
    loop {
        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        attempt += 1;
        let Some(delay) = strategy.next(attempt) else {
            return Err(err);
        };

        tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying");
        tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
