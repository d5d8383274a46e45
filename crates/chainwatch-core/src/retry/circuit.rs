//! Three-state circuit breaker.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Healthy; all calls allowed.
    Closed,
    /// Too many consecutive failures; calls rejected until the reset
    /// timeout elapses.
    Open,
    /// Testing recovery; exactly one probe call is admitted.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half-open"),
        }
    }
}

struct Inner {
    state: CircuitState,
    failures: u32,
    last_failure: Option<Instant>,
    probe_in_flight: bool,
}

/// Tracks consecutive failures and temporarily halts calls when they
/// cross a threshold.
///
/// Thread-safe; clones share no state (wrap in `Arc` to share).
pub struct CircuitBreaker {
    threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// A breaker that opens after `threshold` consecutive failures and
    /// probes again `reset_timeout` after the last failure.
    pub fn new(threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            threshold,
            reset_timeout,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                last_failure: None,
                probe_in_flight: false,
            }),
        }
    }

    /// Reports whether a call is permitted right now.
    ///
    /// In `Open` state, the first call after the reset timeout flips the
    /// breaker to `HalfOpen` and is admitted as the probe; `HalfOpen`
    /// admits no further calls until the probe outcome is recorded.
    pub fn allow(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|t| t.elapsed() > self.reset_timeout)
                    .unwrap_or(true);
                if elapsed {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    tracing::info!("circuit breaker half-open, admitting probe");
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    false
                } else {
                    inner.probe_in_flight = true;
                    true
                }
            }
        }
    }

    /// Records a successful call, closing the breaker.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.state != CircuitState::Closed {
            tracing::info!("circuit breaker closed");
        }
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.probe_in_flight = false;
    }

    /// Records a failed call. Crossing the threshold opens the breaker;
    /// a failed half-open probe reopens it and restarts the timer.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.failures += 1;
        inner.last_failure = Some(Instant::now());
        inner.probe_in_flight = false;
        match inner.state {
            CircuitState::Closed if inner.failures >= self.threshold => {
                inner.state = CircuitState::Open;
                tracing::warn!(failures = inner.failures, "circuit breaker open");
            }
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Open;
                tracing::warn!("circuit breaker probe failed, reopening");
            }
            _ => {}
        }
    }

    /// The current state, without side effects.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().unwrap().state
    }
}
