//! Subscription-driven real-time watching.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use chainwatch_core::{Chain, Error, Log, Query};

use super::{ErrorCallback, EventCallback, Watcher, WatcherState};

/// Delivers logs from a real-time chain subscription.
///
/// The streamer keeps no cursor: events emitted while it is down are
/// not re-delivered on restart. Callers needing gap-free delivery
/// should poll (or combine a fixed-range replay with a poller).
pub struct Streamer {
    chain: Arc<dyn Chain>,
    query: Query,
    on_event: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    state: WatcherState,
}

impl Streamer {
    pub fn new(chain: Arc<dyn Chain>, query: Query) -> Self {
        Self {
            chain,
            query,
            on_event: None,
            on_error: None,
            cancel: CancellationToken::new(),
            handle: None,
            state: WatcherState::Idle,
        }
    }
}

#[async_trait]
impl Watcher for Streamer {
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
                let task = StreamTask {
                    chain: Arc::clone(&self.chain),
                    query: self.query.clone(),
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

struct StreamTask {
    chain: Arc<dyn Chain>,
    query: Query,
    on_event: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
}

impl StreamTask {
    async fn run(self) {
        let chain_id = self.chain.id().to_string();

        let mut sub = match self.chain.subscribe(&self.query).await {
            Ok(sub) => sub,
            Err(err) => {
                self.report(err);
                return;
            }
        };
        tracing::info!(chain = %chain_id, "streamer started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                log = sub.logs.recv() => match log {
                    Some(log) => self.emit(log),
                    None => break, // subscription ended upstream
                },
                err = sub.errors.recv() => match err {
                    Some(err) => self.report(err),
                    None => break,
                },
            }
        }

        // Unsubscribe first, then hand over whatever already arrived.
        sub.unsubscribe();
        while let Ok(log) = sub.logs.try_recv() {
            self.emit(log);
        }
        tracing::debug!(chain = %chain_id, "streamer stopped");
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
