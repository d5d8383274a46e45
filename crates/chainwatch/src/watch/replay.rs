//! Fixed-range historical backfill.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use chainwatch_core::{Chain, Error, Log, Query};

use super::{ErrorCallback, EventCallback, Watcher, WatcherState};

/// Batch size used when 0 is requested.
pub const DEFAULT_REPLAY_BATCH_SIZE: u64 = 2000;

/// Scans a fixed block range once and completes.
///
/// The query must carry both `from_block` and `to_block`. Failed
/// batches are reported through the error callback and skipped; the
/// scan never stalls on a bad range.
pub struct Replay {
    chain: Arc<dyn Chain>,
    query: Query,
    batch_size: u64,
    on_event: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    state: WatcherState,
}

impl Replay {
    pub fn new(chain: Arc<dyn Chain>, query: Query, batch_size: u64) -> Self {
        let batch_size = if batch_size == 0 {
            DEFAULT_REPLAY_BATCH_SIZE
        } else {
            batch_size
        };
        Self {
            chain,
            query,
            batch_size,
            on_event: None,
            on_error: None,
            cancel: CancellationToken::new(),
            handle: None,
            state: WatcherState::Idle,
        }
    }
}

#[async_trait]
impl Watcher for Replay {
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
                let task = ReplayTask {
                    chain: Arc::clone(&self.chain),
                    query: self.query.clone(),
                    batch_size: self.batch_size,
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

struct ReplayTask {
    chain: Arc<dyn Chain>,
    query: Query,
    batch_size: u64,
    on_event: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
}

impl ReplayTask {
    async fn run(self) {
        let chain_id = self.chain.id().to_string();

        let (Some(mut from), Some(to)) = (self.query.from_block, self.query.to_block) else {
            self.report(Error::Other(
                "replay requires both from_block and to_block".into(),
            ));
            return;
        };

        tracing::info!(chain = %chain_id, from, to, "replay started");

        while from <= to {
            if self.cancel.is_cancelled() {
                return;
            }

            let batch_end = from.saturating_add(self.batch_size - 1).min(to);
            let query = self.query.clone().block_range(from, batch_end);

            match self.chain.fetch_logs(&query).await {
                Ok(logs) => {
                    for log in logs {
                        self.emit(log);
                    }
                }
                // Report and move on; the scan must cover the rest.
                Err(err) => {
                    tracing::warn!(chain = %chain_id, from, to = batch_end, error = %err, "replay batch failed");
                    self.report(err);
                }
            }

            let Some(next) = batch_end.checked_add(1) else {
                break;
            };
            from = next;
        }

        tracing::info!(chain = %chain_id, "replay complete");
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
