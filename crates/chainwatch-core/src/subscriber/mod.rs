//! Event delivery endpoints: channel, callback, and broadcast fan-out.

mod broadcast;
mod callback;
mod channel;

pub use broadcast::Broadcast;
pub use callback::Callback;
pub use channel::{Channel, DEFAULT_CHANNEL_CAPACITY};

use crate::event::Log;

/// Receives event logs through a chosen delivery mechanism.
pub trait Subscriber: Send + Sync {
    /// Delivers a log. Never blocks; slow subscribers drop.
    fn send(&self, log: Log);

    /// Shuts the subscriber down. Idempotent.
    fn close(&self);
}
