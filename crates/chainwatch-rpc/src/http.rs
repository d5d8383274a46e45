//! HTTP JSON-RPC transport backed by `reqwest`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chainwatch_core::retry::CircuitBreaker;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse};
use crate::transport::RpcTransport;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Request/response JSON-RPC over HTTP POST.
///
/// Optionally gated by a [`CircuitBreaker`]: when configured, repeated
/// transport failures open the breaker and calls fail fast with
/// [`TransportError::CircuitOpen`] until the endpoint recovers.
pub struct HttpTransport {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    breaker: Option<CircuitBreaker>,
}

impl HttpTransport {
    /// Creates a transport for the given JSON-RPC endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
            breaker: None,
        }
    }

    /// Installs a circuit breaker that opens after `threshold`
    /// consecutive failures and probes again after `reset_timeout`.
    #[must_use]
    pub fn with_circuit_breaker(mut self, threshold: u32, reset_timeout: Duration) -> Self {
        self.breaker = Some(CircuitBreaker::new(threshold, reset_timeout));
        self
    }

    async fn send_once(&self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let resp = self
            .client
            .post(&self.url)
            .json(req)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let body = if body.len() > 256 { &body[..256] } else { &body };
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        resp.json::<JsonRpcResponse>()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        if let Some(breaker) = &self.breaker {
            if !breaker.allow() {
                return Err(TransportError::CircuitOpen {
                    url: self.url.clone(),
                });
            }
        }

        match self.send_once(&req).await {
            Ok(resp) => {
                if let Some(breaker) = &self.breaker {
                    breaker.record_success();
                }
                Ok(resp)
            }
            Err(err) => {
                if let Some(breaker) = &self.breaker {
                    breaker.record_failure();
                }
                tracing::warn!(url = %self.url, method = %req.method, error = %err, "rpc request failed");
                Err(err)
            }
        }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let transport = HttpTransport::new("http://localhost:8545");
        let a = transport.next_id();
        let b = transport.next_id();
        assert!(b > a);
    }

    #[tokio::test]
    async fn open_breaker_fails_fast() {
        let transport = HttpTransport::new("http://localhost:8545")
            .with_circuit_breaker(1, Duration::from_secs(60));

        // trip the breaker directly
        transport.breaker.as_ref().unwrap().record_failure();

        let err = transport
            .send(JsonRpcRequest::new(1, "eth_blockNumber", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::CircuitOpen { .. }));
    }

    #[tokio::test]
    async fn http_transport_refuses_subscriptions() {
        let transport = HttpTransport::new("http://localhost:8545");
        let err = transport.subscribe("logs", vec![]).await.unwrap_err();
        assert!(matches!(err, TransportError::SubscriptionsUnsupported));
    }
}
