//! The event processing pipeline.
//!
//! A [`Handler`] consumes a log and returns the (possibly modified) log,
//! or `None` to drop it. [`Middleware`] wraps handlers with
//! cross-cutting behavior; [`chain`] composes them so that the first
//! middleware added is outermost:
//!
//! ```text
//! log → mws[0] → mws[1] → … → handler
//! ```

mod logger;
mod metrics;
mod rate_limit;

pub use logger::Logger;
pub use metrics::Metrics;
pub use rate_limit::RateLimit;

use std::sync::Arc;

use crate::event::Log;

/// Processes an event log. Returning `None` drops the log.
pub type Handler = Box<dyn Fn(Log) -> Option<Log> + Send + Sync>;

/// Wraps a handler with additional behavior (logging, counting,
/// throttling, annotation).
pub trait Middleware: Send + Sync {
    /// Returns a new handler decorating `next`.
    fn wrap(&self, next: Handler) -> Handler;
}

/// Composes middlewares around `handler`, first middleware outermost.
pub fn chain(handler: Handler, middlewares: &[Arc<dyn Middleware>]) -> Handler {
    let mut handler = handler;
    for mw in middlewares.iter().rev() {
        handler = mw.wrap(handler);
    }
    handler
}
