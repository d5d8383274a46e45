//! The top-level orchestrator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::future::join_all;

use chainwatch_abi::{AbiDecoder, DecodedEvent, Decoder};
use chainwatch_core::{
    middleware, Chain, ChainRegistry, Cursor, Error, Log, MemoryCursor, Middleware, Query,
    Strategy,
};

use crate::config::{Config, PollerConfig};
use crate::watch::{EventCallback, Poller, Watcher};

/// Multi-chain event log monitor.
///
/// Holds the chain registry, the shared progress cursor, the (lazily
/// created) ABI decoder, the middleware pipeline, and one running
/// watcher per watched chain.
///
/// # Example
///
/// ```no_run
/// use chainwatch::{ChainWatch, EvmClient, Query};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), chainwatch::Error> {
/// let watch = ChainWatch::new();
/// watch.add_chain(Arc::new(EvmClient::new("https://mainnet.infura.io/v3/KEY")))?;
///
/// watch
///     .watch("ethereum", Query::new(), |log| {
///         println!("event at block {}", log.block_number);
///     })
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ChainWatch {
    registry: ChainRegistry,
    cursor: Arc<dyn Cursor>,
    retry: Option<Arc<dyn Strategy>>,
    decoder: RwLock<Option<Arc<dyn Decoder>>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    config: Config,
    watchers: tokio::sync::Mutex<HashMap<String, Box<dyn Watcher>>>,
    is_shutdown: AtomicBool,
}

impl Default for ChainWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainWatch {
    /// An instance with default configuration and an in-memory cursor.
    pub fn new() -> Self {
        ChainWatchBuilder::default().build()
    }

    pub fn builder() -> ChainWatchBuilder {
        ChainWatchBuilder::default()
    }

    /// Registers a chain driver. Fails with `ChainAlreadyRegistered`
    /// on a duplicate id.
    pub fn add_chain(&self, chain: Arc<dyn Chain>) -> Result<(), Error> {
        self.registry.register(chain)
    }

    /// Ids of all registered chains.
    pub fn chains(&self) -> Vec<String> {
        self.registry.ids()
    }

    /// Appends middleware to the processing pipeline. Must be called
    /// before any `watch`; watchers already running keep their
    /// pipeline.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    /// The configured decoder, if any has been set or created.
    pub fn decoder(&self) -> Option<Arc<dyn Decoder>> {
        self.decoder.read().unwrap().clone()
    }

    /// Registers an event signature for decoding, creating an
    /// [`AbiDecoder`] if none is configured yet.
    ///
    /// ```text
    /// watch.register_event("Transfer(address indexed from, address indexed to, uint256 value)")?;
    /// ```
    pub fn register_event(&self, signature: &str) -> Result<(), Error> {
        self.ensure_decoder().register(signature)?;
        Ok(())
    }

    /// Registers every event from a standard JSON ABI, creating an
    /// [`AbiDecoder`] if none is configured yet. Non-event entries are
    /// ignored.
    pub fn register_event_json(&self, abi: &[u8]) -> Result<(), Error> {
        self.ensure_decoder().register_json(abi)?;
        Ok(())
    }

    fn ensure_decoder(&self) -> Arc<dyn Decoder> {
        let mut decoder = self.decoder.write().unwrap();
        decoder
            .get_or_insert_with(|| Arc::new(AbiDecoder::new()))
            .clone()
    }

    /// Starts watching a chain for logs matching `query`. The handler
    /// runs behind the middleware pipeline on the watcher's own task.
    pub async fn watch<F>(&self, chain_id: &str, query: Query, handler: F) -> Result<(), Error>
    where
        F: Fn(Log) + Send + Sync + 'static,
    {
        self.watch_with(chain_id, query, Arc::new(handler)).await
    }

    /// Like [`watch`](Self::watch), but delivers decoded events. Logs
    /// whose signature is not registered are skipped silently.
    pub async fn watch_decoded<F>(
        &self,
        chain_id: &str,
        query: Query,
        handler: F,
    ) -> Result<(), Error>
    where
        F: Fn(DecodedEvent) + Send + Sync + 'static,
    {
        let Some(decoder) = self.decoder() else {
            return Err(Error::Other(
                "no decoder configured; call register_event first".into(),
            ));
        };

        let handler = Arc::new(handler);
        self.watch_with(
            chain_id,
            query,
            Arc::new(move |log: Log| {
                if let Ok(event) = decoder.decode(&log) {
                    handler(event);
                }
            }),
        )
        .await
    }

    /// Watches every registered chain with the same query and handler.
    pub async fn watch_all<F>(&self, query: Query, handler: F) -> Result<(), Error>
    where
        F: Fn(Log) + Send + Sync + 'static,
    {
        let handler: EventCallback = Arc::new(handler);
        for chain_id in self.registry.ids() {
            self.watch_with(&chain_id, query.clone(), Arc::clone(&handler))
                .await?;
        }
        Ok(())
    }

    async fn watch_with(
        &self,
        chain_id: &str,
        query: Query,
        handler: EventCallback,
    ) -> Result<(), Error> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            return Err(Error::Shutdown);
        }
        let chain = self
            .registry
            .get(chain_id)
            .ok_or_else(|| Error::ChainNotFound(chain_id.to_string()))?;

        // Middleware pipeline with the user handler as terminal.
        let pipeline = middleware::chain(
            Box::new(move |log: Log| {
                handler(log.clone());
                Some(log)
            }),
            &self.middlewares,
        );
        let on_event: EventCallback = Arc::new(move |log: Log| {
            let _ = pipeline(log);
        });

        let mut watchers = self.watchers.lock().await;
        if watchers.contains_key(chain_id) {
            return Err(Error::AlreadyRunning(chain_id.to_string()));
        }

        let mut poller = Poller::new(
            chain,
            query,
            Arc::clone(&self.cursor),
            self.config.poller.clone(),
        );
        if let Some(strategy) = &self.retry {
            poller = poller.with_retry(Arc::clone(strategy));
        }
        poller.on_event(on_event);
        let error_chain = chain_id.to_string();
        poller.on_error(Arc::new(move |err| {
            tracing::warn!(chain = %error_chain, error = %err, "watch error");
        }));

        poller.watch()?;
        watchers.insert(chain_id.to_string(), Box::new(poller));
        Ok(())
    }

    /// Stops all watchers, waiting at most `timeout`. The instance
    /// refuses new `watch` calls afterwards. On timeout the remaining
    /// watchers are still stopping in the background.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), Error> {
        self.is_shutdown.store(true, Ordering::SeqCst);

        let drained: Vec<(String, Box<dyn Watcher>)> =
            self.watchers.lock().await.drain().collect();
        let stops = drained.into_iter().map(|(chain_id, mut watcher)| async move {
            if let Err(err) = watcher.stop().await {
                tracing::warn!(chain = %chain_id, error = %err, "watcher stop failed");
            }
        });

        match tokio::time::timeout(timeout, join_all(stops)).await {
            Ok(_) => Ok(()),
            Err(_) => Err(Error::ShutdownTimeout),
        }
    }
}

/// Builder for [`ChainWatch`].
#[derive(Default)]
pub struct ChainWatchBuilder {
    cursor: Option<Arc<dyn Cursor>>,
    retry: Option<Arc<dyn Strategy>>,
    decoder: Option<Arc<dyn Decoder>>,
    middlewares: Vec<Arc<dyn Middleware>>,
    config: Config,
}

impl ChainWatchBuilder {
    /// Sets the progress cursor (default: in-memory).
    #[must_use]
    pub fn cursor(mut self, cursor: Arc<dyn Cursor>) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sets the retry strategy applied around watcher RPC calls
    /// (default: none).
    #[must_use]
    pub fn retry(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.retry = Some(strategy);
        self
    }

    /// Sets the event decoder (default: an [`AbiDecoder`] created
    /// lazily on the first registration).
    #[must_use]
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Appends middleware to the pipeline.
    #[must_use]
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    /// Replaces the full poller configuration.
    #[must_use]
    pub fn poller(mut self, poller: PollerConfig) -> Self {
        self.config.poller = poller;
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poller.interval = interval;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, batch_size: u64) -> Self {
        self.config.poller.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn confirmations(mut self, confirmations: u64) -> Self {
        self.config.poller.confirmations = confirmations;
        self
    }

    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log_level = level.into();
        self
    }

    pub fn build(self) -> ChainWatch {
        ChainWatch {
            registry: ChainRegistry::new(),
            cursor: self.cursor.unwrap_or_else(|| Arc::new(MemoryCursor::new())),
            retry: self.retry,
            decoder: RwLock::new(self.decoder),
            middlewares: self.middlewares,
            config: self.config,
            watchers: tokio::sync::Mutex::new(HashMap::new()),
            is_shutdown: AtomicBool::new(false),
        }
    }
}
