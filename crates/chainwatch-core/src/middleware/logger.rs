//! Logging middleware.

use super::{Handler, Middleware};

/// Emits a structured `tracing` event for every log passing through the
/// pipeline. Side effect only; never modifies or drops logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for Logger {
    fn wrap(&self, next: Handler) -> Handler {
        Box::new(move |log| {
            tracing::info!(
                chain = %log.chain,
                block = log.block_number,
                tx = %log.tx_hash,
                log_index = log.log_index,
                address = %log.address,
                topic0 = %log.event_signature(),
                "event log"
            );
            next(log)
        })
    }
}
