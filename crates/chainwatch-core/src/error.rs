//! The public error taxonomy.
//!
//! Component crates keep their own structured error types (transport,
//! ABI parsing, decoding) and convert into these variants at the public
//! boundary.

use thiserror::Error;

/// Errors surfaced by the chainwatch SDK.
#[derive(Debug, Error)]
pub enum Error {
    /// Operating on a chain id that was never registered.
    #[error("chain not found: {0}")]
    ChainNotFound(String),

    /// Adding a chain whose id is already registered.
    #[error("chain already registered: {0}")]
    ChainAlreadyRegistered(String),

    /// Starting a watcher that is already running.
    #[error("watcher already running: {0}")]
    AlreadyRunning(String),

    /// Stopping (or restarting) a watcher that never ran.
    #[error("watcher not running: {0}")]
    NotRunning(String),

    /// Operating on an instance that has been shut down.
    #[error("instance has been shut down")]
    Shutdown,

    /// The shutdown deadline fired while watchers were still stopping.
    #[error("shutdown timed out with watchers still stopping")]
    ShutdownTimeout,

    /// A malformed address string.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A malformed hash string.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// An event signature or JSON ABI that cannot be parsed.
    #[error("invalid ABI: {0}")]
    InvalidAbi(String),

    /// Event log data that cannot be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// RPC or WebSocket connection failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Cursor persistence I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Cursor state serialization failure.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Anything that does not fit the taxonomy above.
    #[error("{0}")]
    Other(String),
}
