//! Transport-level error types.

use thiserror::Error;

use crate::request::JsonRpcError;

/// Errors that can occur during an RPC transport operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, timeout, non-200).
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket connect/send/receive failure.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON-RPC error returned by the node.
    #[error(transparent)]
    Rpc(JsonRpcError),

    /// Circuit breaker is open; the endpoint is considered unhealthy.
    #[error("circuit breaker open for {url}")]
    CircuitOpen { url: String },

    /// The transport cannot stream (HTTP).
    #[error("subscriptions are not supported by this transport")]
    SubscriptionsUnsupported,

    /// The connection dropped before a response arrived.
    #[error("connection closed before response")]
    ConnectionClosed,

    /// Response payload could not be deserialized.
    #[error("deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

impl TransportError {
    /// Whether the error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::WebSocket(_) | Self::ConnectionClosed
        )
    }
}

impl From<TransportError> for chainwatch_core::Error {
    fn from(err: TransportError) -> Self {
        chainwatch_core::Error::Connection(err.to_string())
    }
}
