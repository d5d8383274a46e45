//! The EVM chain driver.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use chainwatch_core::{Chain, Error, Log, Query, Subscription};
use chainwatch_rpc::{call, HttpTransport, RpcTransport, WsConfig, WsTransport};

use crate::convert::{parse_hex_u64, RpcLog};

/// EVM-compatible chain driver speaking JSON-RPC.
///
/// The transport is selected from the URL scheme: `ws://`/`wss://`
/// endpoints get the duplex WebSocket transport (and therefore
/// subscriptions), everything else speaks HTTP. Constructing a
/// WebSocket-backed client requires a running Tokio runtime.
pub struct EvmClient {
    id: String,
    transport: Arc<dyn RpcTransport>,
}

impl EvmClient {
    /// An Ethereum mainnet client for the given endpoint.
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::with_id("ethereum", rpc_url)
    }

    /// A client for any EVM-compatible chain under a custom id
    /// (`"bsc"`, `"polygon"`, `"arbitrum"`, …).
    pub fn with_id(id: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        let url = rpc_url.into();
        let transport: Arc<dyn RpcTransport> =
            if url.starts_with("ws://") || url.starts_with("wss://") {
                Arc::new(WsTransport::connect(url, WsConfig::default()))
            } else {
                Arc::new(HttpTransport::new(url))
            };
        Self {
            id: id.into(),
            transport,
        }
    }

    /// A client over a caller-provided transport.
    pub fn with_transport(id: impl Into<String>, transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            id: id.into(),
            transport,
        }
    }
}

#[async_trait]
impl Chain for EvmClient {
    fn id(&self) -> &str {
        &self.id
    }

    async fn latest_block(&self) -> Result<u64, Error> {
        let hex: String = call(self.transport.as_ref(), "eth_blockNumber", vec![]).await?;
        parse_hex_u64(&hex)
    }

    async fn fetch_logs(&self, query: &Query) -> Result<Vec<Log>, Error> {
        let params = filter_params(query);
        let raw: Vec<RpcLog> =
            call(self.transport.as_ref(), "eth_getLogs", vec![params]).await?;

        let mut logs = raw
            .into_iter()
            .map(|r| r.into_log(&self.id))
            .collect::<Result<Vec<_>, _>>()?;
        logs.sort_by_key(|l| (l.block_number, l.log_index));
        Ok(logs)
    }

    async fn subscribe(&self, query: &Query) -> Result<Subscription, Error> {
        let params = filter_params(query);
        let raw = self.transport.subscribe("logs", vec![params]).await?;

        let (log_tx, log_rx) = mpsc::channel(64);
        let (err_tx, err_rx) = mpsc::channel(1);
        let chain_id = self.id.clone();
        let mut notifications = raw.notifications;

        tokio::spawn(async move {
            while let Some(payload) = notifications.recv().await {
                let parsed = serde_json::from_value::<RpcLog>(payload)
                    .map_err(|e| Error::Connection(format!("malformed log notification: {e}")))
                    .and_then(|rpc| rpc.into_log(&chain_id));
                match parsed {
                    Ok(log) => {
                        if log_tx.send(log).await.is_err() {
                            return; // subscriber went away
                        }
                    }
                    Err(err) => {
                        let _ = err_tx.try_send(err);
                    }
                }
            }
        });

        let transport = Arc::clone(&self.transport);
        let sub_id = raw.id;
        Ok(Subscription::new(log_rx, err_rx, move || {
            tokio::spawn(async move {
                if let Err(err) = transport.unsubscribe(&sub_id).await {
                    tracing::debug!(subscription = %sub_id, error = %err, "unsubscribe failed");
                }
            });
        }))
    }
}

/// Builds the `eth_getLogs` / `eth_subscribe` filter object.
///
/// - `fromBlock`/`toBlock`: hex-prefixed block numbers
/// - `address`: a single hex string for one address, an array otherwise
/// - `topics`: positional; `null` matches any, one hash is a string,
///   several are an array
fn filter_params(query: &Query) -> Value {
    let mut params = serde_json::Map::new();

    if let Some(from) = query.from_block {
        params.insert("fromBlock".into(), json!(format!("0x{from:x}")));
    }
    if let Some(to) = query.to_block {
        params.insert("toBlock".into(), json!(format!("0x{to:x}")));
    }

    if !query.addresses.is_empty() {
        let addrs: Vec<String> = query.addresses.iter().map(|a| a.to_hex()).collect();
        if addrs.len() == 1 {
            params.insert("address".into(), json!(addrs[0]));
        } else {
            params.insert("address".into(), json!(addrs));
        }
    }

    if !query.topics.is_empty() {
        let topics: Vec<Value> = query
            .topics
            .iter()
            .map(|position| match position.len() {
                0 => Value::Null,
                1 => json!(position[0].to_hex()),
                _ => json!(position.iter().map(|h| h.to_hex()).collect::<Vec<_>>()),
            })
            .collect();
        params.insert("topics".into(), json!(topics));
    }

    Value::Object(params)
}
