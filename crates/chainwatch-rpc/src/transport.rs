//! The `RpcTransport` trait.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// A live subscription at the transport level: the server-assigned
/// subscription id and the stream of raw notification payloads.
#[derive(Debug)]
pub struct RawSubscription {
    pub id: String,
    pub notifications: mpsc::UnboundedReceiver<Value>,
}

/// The async trait every JSON-RPC transport implements.
///
/// Implementations are `Send + Sync` and object-safe; drivers hold
/// them as `Arc<dyn RpcTransport>`.
#[async_trait]
pub trait RpcTransport: Send + Sync + 'static {
    /// Sends a single request and returns the raw response.
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError>;

    /// Hands out the next unique request id for this transport.
    fn next_id(&self) -> u64;

    /// Opens a streaming subscription of the given kind (e.g. `"logs"`).
    ///
    /// Only duplex transports support this; the default refuses.
    async fn subscribe(
        &self,
        _kind: &str,
        _params: Vec<Value>,
    ) -> Result<RawSubscription, TransportError> {
        Err(TransportError::SubscriptionsUnsupported)
    }

    /// Tears down a subscription by server-assigned id. Idempotent;
    /// the default is a no-op for transports without subscriptions.
    async fn unsubscribe(&self, _subscription: &str) -> Result<(), TransportError> {
        Ok(())
    }

    /// The endpoint URL.
    fn url(&self) -> &str;
}

/// Calls a method and deserializes the result.
pub async fn call<T: DeserializeOwned>(
    transport: &dyn RpcTransport,
    method: &str,
    params: Vec<Value>,
) -> Result<T, TransportError> {
    let req = JsonRpcRequest::new(transport.next_id(), method, params);
    let resp = transport.send(req).await?;
    let result = resp.into_result().map_err(TransportError::Rpc)?;
    serde_json::from_value(result).map_err(TransportError::Deserialization)
}
