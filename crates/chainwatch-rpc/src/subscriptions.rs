//! WebSocket subscription bookkeeping.
//!
//! Tracks active `eth_subscribe` subscriptions so notifications can be
//! routed to their consumers and subscriptions re-established after a
//! reconnect (the server assigns a fresh id; `rekey` moves the entry).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;

#[derive(Clone)]
struct Entry {
    /// Subscription kind (e.g. `"logs"`, `"newHeads"`).
    kind: String,
    /// Parameters needed to re-subscribe.
    params: Vec<Value>,
    /// Forwards incoming notification payloads to the consumer.
    sender: mpsc::UnboundedSender<Value>,
}

/// Shared registry of active subscriptions, keyed by the
/// server-assigned subscription id.
#[derive(Clone, Default)]
pub struct SubscriptionManager {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscription and returns the consumer's receiver.
    pub fn register(
        &self,
        id: String,
        kind: String,
        params: Vec<Value>,
    ) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.entries.lock().unwrap().insert(
            id,
            Entry {
                kind,
                params,
                sender: tx,
            },
        );
        rx
    }

    /// Routes a notification payload to its consumer. Unknown ids are
    /// dropped.
    pub fn dispatch(&self, id: &str, payload: Value) {
        if let Some(entry) = self.entries.lock().unwrap().get(id) {
            let _ = entry.sender.send(payload);
        }
    }

    /// Removes a subscription (after `eth_unsubscribe`). Dropping the
    /// sender closes the consumer's channel.
    pub fn remove(&self, id: &str) {
        self.entries.lock().unwrap().remove(id);
    }

    /// Moves a subscription to the fresh id assigned after reconnect.
    pub fn rekey(&self, old_id: &str, new_id: String) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.remove(old_id) {
            entries.insert(new_id, entry);
        }
    }

    /// Snapshot of `(id, kind, params)` for every active subscription,
    /// used to re-subscribe after a reconnect.
    pub fn active(&self) -> Vec<(String, String, Vec<Value>)> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(id, e)| (id.clone(), e.kind.clone(), e.params.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_dispatch() {
        let manager = SubscriptionManager::new();
        let mut rx = manager.register("0xdead".into(), "logs".into(), vec![]);

        manager.dispatch("0xdead", serde_json::json!({"logIndex": "0x1"}));
        let payload = rx.try_recv().unwrap();
        assert_eq!(payload["logIndex"], "0x1");
    }

    #[test]
    fn remove_closes_consumer_channel() {
        let manager = SubscriptionManager::new();
        let mut rx = manager.register("0x1".into(), "logs".into(), vec![]);
        assert_eq!(manager.len(), 1);

        manager.remove("0x1");
        assert!(manager.is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn rekey_moves_entry() {
        let manager = SubscriptionManager::new();
        let mut rx = manager.register("0xold".into(), "logs".into(), vec![]);

        manager.rekey("0xold", "0xnew".into());
        manager.dispatch("0xold", serde_json::json!(1));
        manager.dispatch("0xnew", serde_json::json!(2));

        assert_eq!(rx.try_recv().unwrap(), serde_json::json!(2));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn active_lists_resubscribe_state() {
        let manager = SubscriptionManager::new();
        manager.register("0xa".into(), "newHeads".into(), vec![]);
        manager.register("0xb".into(), "logs".into(), vec![serde_json::json!({})]);

        let mut active = manager.active();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(active.len(), 2);
        assert_eq!(active[1].1, "logs");
    }
}
