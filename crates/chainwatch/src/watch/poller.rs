//! Cursor-driven block-range polling.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use chainwatch_core::{retry, Batch, Chain, Cursor, Error, Log, Query, Strategy};

use super::{ErrorCallback, EventCallback, Watcher, WatcherState};
use crate::config::PollerConfig;

/// Polls a chain for event logs in block ranges, committing progress to
/// a [`Cursor`] after each delivered batch.
///
/// Resumption: with a saved cursor `n` the poller continues at `n + 1`;
/// on a cold start it begins at the chain's safe head
/// (`latest − confirmations`) rather than replaying from genesis.
///
/// Delivery is at-least-once: the cursor is saved after emission, so a
/// crash between emit and save re-delivers that range on restart.
/// Handlers must be idempotent or tolerate duplicates.
pub struct Poller {
    chain: Arc<dyn Chain>,
    query: Query,
    cursor: Arc<dyn Cursor>,
    config: PollerConfig,
    retry: Option<Arc<dyn Strategy>>,
    on_event: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    state: WatcherState,
}

impl Poller {
    pub fn new(
        chain: Arc<dyn Chain>,
        query: Query,
        cursor: Arc<dyn Cursor>,
        config: PollerConfig,
    ) -> Self {
        Self {
            chain,
            query,
            cursor,
            config,
            retry: None,
            on_event: None,
            on_error: None,
            cancel: CancellationToken::new(),
            handle: None,
            state: WatcherState::Idle,
        }
    }

    /// Installs a retry strategy applied around each RPC call.
    #[must_use]
    pub fn with_retry(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.retry = Some(strategy);
        self
    }
}

#[async_trait]
impl Watcher for Poller {
    fn on_event(&mut self, callback: EventCallback) {
        self.on_event = Some(callback);
    }

    fn on_error(&mut self, callback: ErrorCallback) {
        self.on_error = Some(callback);
    }

    fn watch(&mut self) -> Result<(), Error> {
        match self.state {
            WatcherState::Running => Err(Error::AlreadyRunning(self.chain.id().to_string())),
            WatcherState::Stopped => Err(Error::NotRunning(self.chain.id().to_string())),
            WatcherState::Idle => {
                let task = PollTask {
                    chain: Arc::clone(&self.chain),
                    query: self.query.clone(),
                    cursor: Arc::clone(&self.cursor),
                    config: self.config.clone(),
                    retry: self.retry.clone(),
                    on_event: self.on_event.clone(),
                    on_error: self.on_error.clone(),
                    cancel: self.cancel.clone(),
                };
                self.handle = Some(tokio::spawn(task.run()));
                self.state = WatcherState::Running;
                Ok(())
            }
        }
    }

    async fn stop(&mut self) -> Result<(), Error> {
        match self.state {
            WatcherState::Idle => Err(Error::NotRunning(self.chain.id().to_string())),
            WatcherState::Stopped => Ok(()),
            WatcherState::Running => {
                self.cancel.cancel();
                if let Some(handle) = self.handle.take() {
                    let _ = handle.await;
                }
                self.state = WatcherState::Stopped;
                Ok(())
            }
        }
    }

    fn state(&self) -> WatcherState {
        self.state
    }
}

struct PollTask {
    chain: Arc<dyn Chain>,
    query: Query,
    cursor: Arc<dyn Cursor>,
    config: PollerConfig,
    retry: Option<Arc<dyn Strategy>>,
    on_event: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
}

impl PollTask {
    async fn run(self) {
        let chain_id = self.chain.id().to_string();

        // A cursor that cannot even be read at startup terminates the
        // watcher; every later failure only skips a cycle.
        let last = match self.cursor.load(&chain_id).await {
            Ok(last) => last,
            Err(err) => {
                self.report(err);
                return;
            }
        };

        let mut from = if last > 0 {
            last + 1
        } else {
            let latest = match self.latest_block().await {
                Ok(latest) => latest,
                Err(Error::Cancelled) => return,
                Err(err) => {
                    self.report(err);
                    return;
                }
            };
            latest.saturating_sub(self.config.confirmations)
        };

        tracing::info!(chain = %chain_id, from, "poller started");

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick fires immediately, so the initial cycle does
        // not wait a full interval.
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(chain = %chain_id, "poller stopped");
                    return;
                }
                _ = ticker.tick() => self.poll_cycle(&chain_id, &mut from).await,
            }
        }
    }

    /// One polling cycle. Errors are reported and leave `from`
    /// untouched, so the next tick retries the same range.
    async fn poll_cycle(&self, chain_id: &str, from: &mut u64) {
        let latest = match self.latest_block().await {
            Ok(latest) => latest,
            Err(Error::Cancelled) => return,
            Err(err) => {
                self.report(err);
                return;
            }
        };

        if latest <= self.config.confirmations {
            return; // not enough history yet
        }
        let safe = latest - self.config.confirmations;
        if *from > safe {
            return; // caught up
        }

        let to = (*from + self.config.batch_size.max(1) - 1).min(safe);
        let query = self.query.clone().block_range(*from, to);
        let logs = match self.fetch_logs(&query).await {
            Ok(logs) => logs,
            Err(Error::Cancelled) => return,
            Err(err) => {
                tracing::warn!(chain = %chain_id, from = *from, to, error = %err, "fetch logs failed");
                self.report(err);
                return;
            }
        };

        let batch = Batch {
            logs,
            from_block: *from,
            to_block: to,
        };
        tracing::debug!(chain = %chain_id, from = batch.from_block, to = batch.to_block, logs = batch.len(), "poll cycle");

        for log in batch.logs {
            self.emit(log);
        }

        // Save after emission: at-least-once across a crash window.
        match self.cursor.save(chain_id, to).await {
            Ok(()) => *from = to + 1,
            Err(err) => self.report(err),
        }
    }

    async fn latest_block(&self) -> Result<u64, Error> {
        match &self.retry {
            Some(strategy) => {
                let chain = Arc::clone(&self.chain);
                retry::run(&self.cancel, strategy.as_ref(), move || {
                    let chain = Arc::clone(&chain);
                    async move { chain.latest_block().await }
                })
                .await
            }
            None => self.chain.latest_block().await,
        }
    }

    async fn fetch_logs(&self, query: &Query) -> Result<Vec<Log>, Error> {
        match &self.retry {
            Some(strategy) => {
                let chain = Arc::clone(&self.chain);
                let query = query.clone();
                retry::run(&self.cancel, strategy.as_ref(), move || {
                    let chain = Arc::clone(&chain);
                    let query = query.clone();
                    async move { chain.fetch_logs(&query).await }
                })
                .await
            }
            None => self.chain.fetch_logs(query).await,
        }
    }

    fn emit(&self, log: Log) {
        if let Some(on_event) = &self.on_event {
            on_event(log);
        }
    }

    fn report(&self, err: Error) {
        if let Some(on_error) = &self.on_error {
            on_error(err);
        }
    }
}
