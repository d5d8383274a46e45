//! The chain driver contract and the registry of configured chains.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::event::Log;
use crate::filter::Query;

/// The core abstraction over a blockchain endpoint.
///
/// Each supported chain provides an implementation; EVM-compatible
/// chains share one implementation parameterised by chain id.
#[async_trait]
pub trait Chain: Send + Sync + 'static {
    /// The unique chain identifier (e.g. `"ethereum"`, `"bsc"`).
    fn id(&self) -> &str;

    /// The most recent block number.
    async fn latest_block(&self) -> Result<u64, Error>;

    /// Historical event logs matching the query, sorted ascending by
    /// `(block_number, log_index)`.
    async fn fetch_logs(&self, query: &Query) -> Result<Vec<Log>, Error>;

    /// A real-time log subscription. Only available on duplex
    /// transports; HTTP-backed drivers return `Error::Connection`.
    async fn subscribe(&self, query: &Query) -> Result<Subscription, Error>;
}

/// An active real-time log subscription.
///
/// Dropping the subscription unsubscribes.
pub struct Subscription {
    /// Incoming event logs.
    pub logs: mpsc::Receiver<Log>,
    /// Subscription errors (malformed notifications, stream failures).
    pub errors: mpsc::Receiver<Error>,
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        logs: mpsc::Receiver<Log>,
        errors: mpsc::Receiver<Error>,
        unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            logs,
            errors,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Terminates the subscription. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Registered chain drivers, looked up by id.
#[derive(Default)]
pub struct ChainRegistry {
    chains: RwLock<HashMap<String, Arc<dyn Chain>>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chain. Fails if the id is already registered.
    pub fn register(&self, chain: Arc<dyn Chain>) -> Result<(), Error> {
        let id = chain.id().to_string();
        let mut chains = self.chains.write().unwrap();
        if chains.contains_key(&id) {
            return Err(Error::ChainAlreadyRegistered(id));
        }
        chains.insert(id, chain);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Chain>> {
        self.chains.read().unwrap().get(id).cloned()
    }

    pub fn all(&self) -> Vec<Arc<dyn Chain>> {
        self.chains.read().unwrap().values().cloned().collect()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.chains.read().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.chains.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
