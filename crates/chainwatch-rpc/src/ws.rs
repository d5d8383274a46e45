//! WebSocket JSON-RPC transport.
//!
//! A background task owns the socket and multiplexes caller requests
//! over it. On disconnect it reconnects with exponential backoff and
//! re-issues `eth_subscribe` for every active subscription, rekeying
//! entries to the fresh server-assigned ids.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

use crate::error::TransportError;
use crate::request::{JsonRpcRequest, JsonRpcResponse, SubscriptionNotice};
use crate::subscriptions::SubscriptionManager;
use crate::transport::{call, RawSubscription, RpcTransport};

/// WebSocket transport configuration.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// First reconnect delay after a disconnect.
    pub reconnect_initial: Duration,
    /// Cap on the reconnect delay.
    pub reconnect_max: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(60),
        }
    }
}

enum WsCommand {
    Send {
        req: JsonRpcRequest,
        reply: oneshot::Sender<Result<JsonRpcResponse, TransportError>>,
    },
    Close,
}

/// Duplex JSON-RPC over a WebSocket connection.
///
/// The connection is established (and re-established) lazily by the
/// background task; callers block on their individual requests.
pub struct WsTransport {
    url: String,
    commands: mpsc::UnboundedSender<WsCommand>,
    subscriptions: SubscriptionManager,
    next_id: AtomicU64,
}

impl WsTransport {
    /// Starts the background connection task for `url`.
    pub fn connect(url: impl Into<String>, config: WsConfig) -> Self {
        let url = url.into();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let subscriptions = SubscriptionManager::new();

        tokio::spawn(ws_task(
            url.clone(),
            cmd_rx,
            subscriptions.clone(),
            config,
        ));

        Self {
            url,
            commands: cmd_tx,
            subscriptions,
            next_id: AtomicU64::new(1),
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        let _ = self.commands.send(WsCommand::Close);
    }
}

#[async_trait]
impl RpcTransport for WsTransport {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(WsCommand::Send { req, reply })
            .map_err(|_| TransportError::ConnectionClosed)?;
        rx.await.map_err(|_| TransportError::ConnectionClosed)?
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn subscribe(
        &self,
        kind: &str,
        params: Vec<Value>,
    ) -> Result<RawSubscription, TransportError> {
        let mut full = vec![Value::String(kind.to_string())];
        full.extend(params.iter().cloned());

        // eth_subscribe returns the subscription id as the result
        let id: String = call(self, "eth_subscribe", full).await?;
        let notifications = self
            .subscriptions
            .register(id.clone(), kind.to_string(), params);
        Ok(RawSubscription { id, notifications })
    }

    async fn unsubscribe(&self, subscription: &str) -> Result<(), TransportError> {
        self.subscriptions.remove(subscription);
        // Best effort on the wire; the local entry is already gone.
        if let Err(err) = call::<bool>(
            self,
            "eth_unsubscribe",
            vec![Value::String(subscription.to_string())],
        )
        .await
        {
            tracing::debug!(subscription, error = %err, "eth_unsubscribe failed");
        }
        Ok(())
    }

    fn url(&self) -> &str {
        &self.url
    }
}

type Pending = HashMap<u64, oneshot::Sender<Result<JsonRpcResponse, TransportError>>>;

/// Request ids the background task uses for its own re-subscribe
/// traffic, disjoint from caller ids.
const RESUBSCRIBE_ID_BASE: u64 = 1 << 62;

/// Background task owning the WebSocket connection.
async fn ws_task(
    url: String,
    mut commands: mpsc::UnboundedReceiver<WsCommand>,
    subscriptions: SubscriptionManager,
    config: WsConfig,
) {
    let mut backoff = config.reconnect_initial;
    let mut resub_id = RESUBSCRIBE_ID_BASE;

    loop {
        tracing::info!(url = %url, "connecting WebSocket");
        let stream = match tokio_tungstenite::connect_async(&url).await {
            Ok((stream, _)) => stream,
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "WebSocket connect failed, retrying in {backoff:?}");
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(config.reconnect_max);
                continue;
            }
        };

        backoff = config.reconnect_initial;
        let (mut sink, mut reader) = stream.split();
        let mut pending: Pending = HashMap::new();
        // request id → old subscription id, for rekeying on response
        let mut resubscribing: HashMap<u64, String> = HashMap::new();

        // Re-establish subscriptions that survived a previous connection.
        for (old_id, kind, params) in subscriptions.active() {
            let id = resub_id;
            resub_id += 1;
            let mut full = vec![Value::String(kind)];
            full.extend(params);
            let req = JsonRpcRequest::new(id, "eth_subscribe", full);
            if let Ok(text) = serde_json::to_string(&req) {
                if sink.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
                resubscribing.insert(id, old_id);
            }
        }

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    None | Some(WsCommand::Close) => return,
                    Some(WsCommand::Send { req, reply }) => {
                        match serde_json::to_string(&req) {
                            Ok(text) => {
                                let id = req.id;
                                pending.insert(id, reply);
                                if sink.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                let _ = reply.send(Err(TransportError::Deserialization(err)));
                            }
                        }
                    }
                },
                msg = reader.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_message(text.as_str(), &mut pending, &mut resubscribing, &subscriptions);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::warn!(url = %url, error = %err, "WebSocket receive error");
                        break;
                    }
                    _ => {}
                },
            }
        }

        // Callers waiting on the dead connection get an error rather
        // than hanging across the reconnect.
        for (_, reply) in pending.drain() {
            let _ = reply.send(Err(TransportError::ConnectionClosed));
        }

        tracing::warn!(url = %url, "WebSocket disconnected, reconnecting in {backoff:?}");
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(config.reconnect_max);
    }
}

fn handle_message(
    text: &str,
    pending: &mut Pending,
    resubscribing: &mut HashMap<u64, String>,
    subscriptions: &SubscriptionManager,
) {
    // Server-pushed notification?
    if let Ok(notice) = serde_json::from_str::<SubscriptionNotice>(text) {
        if notice.method == "eth_subscription" {
            subscriptions.dispatch(&notice.params.subscription, notice.params.result);
        }
        return;
    }

    let Ok(resp) = serde_json::from_str::<JsonRpcResponse>(text) else {
        tracing::debug!("unparseable WebSocket message");
        return;
    };
    let Some(id) = resp.id else { return };

    // A response to our own re-subscribe carries the fresh sub id.
    if let Some(old_id) = resubscribing.remove(&id) {
        if let Ok(Value::String(new_id)) = resp.into_result() {
            subscriptions.rekey(&old_id, new_id);
        }
        return;
    }

    if let Some(reply) = pending.remove(&id) {
        let _ = reply.send(Ok(resp));
    }
}
