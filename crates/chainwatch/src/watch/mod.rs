//! Watcher engines.
//!
//! Three ways to follow a chain:
//!
//! - [`Poller`] — cursor-driven block-range polling, resumable across
//!   restarts
//! - [`Streamer`] — real-time delivery over a log subscription
//! - [`Replay`] — one-shot backfill of a fixed block range
//!
//! Each owns one background task and reports through registered event
//! and error callbacks. Handlers run on the watcher's task, serialized,
//! in ascending `(block_number, log_index)` order per chain.

mod poller;
mod replay;
mod streamer;

pub use poller::Poller;
pub use replay::Replay;
pub use streamer::Streamer;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use chainwatch_core::{Error, Log};

/// Callback invoked for each delivered event log.
pub type EventCallback = Arc<dyn Fn(Log) + Send + Sync>;

/// Callback invoked for watcher errors.
pub type ErrorCallback = Arc<dyn Fn(Error) + Send + Sync>;

/// Lifecycle of a watcher. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for WatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// A background task monitoring one chain for event logs.
#[async_trait]
pub trait Watcher: Send {
    /// Registers the event callback. Set before [`watch`](Self::watch).
    fn on_event(&mut self, callback: EventCallback);

    /// Registers the error callback. Set before [`watch`](Self::watch).
    fn on_error(&mut self, callback: ErrorCallback);

    /// Starts the background task. Fails with `AlreadyRunning` when
    /// running; a stopped watcher cannot be restarted.
    fn watch(&mut self) -> Result<(), Error>;

    /// Cancels the task and waits for it to exit. Stopping an idle
    /// watcher fails with `NotRunning`; stopping twice is a no-op.
    async fn stop(&mut self) -> Result<(), Error>;

    /// The current lifecycle state.
    fn state(&self) -> WatcherState;
}
