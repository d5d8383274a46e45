//! # chainwatch-core
//!
//! Core types and traits shared across all chainwatch crates: the event
//! model, filter/query types, the chain driver contract, the progress
//! cursor, retry policies, the middleware pipeline, and subscriber
//! fan-out primitives.

pub mod chain;
pub mod cursor;
pub mod error;
pub mod event;
pub mod filter;
pub mod middleware;
pub mod retry;
pub mod subscriber;

pub use chain::{Chain, ChainRegistry, Subscription};
pub use cursor::{Cursor, FileCursor, MemoryCursor};
pub use error::Error;
pub use event::{Address, Batch, Hash, Log};
pub use filter::{LogFilter, Query};
pub use middleware::{Handler, Middleware};
pub use retry::{Backoff, CircuitBreaker, CircuitState, Strategy};
pub use subscriber::{Broadcast, Callback, Channel, Subscriber};
