//! # chainwatch
//!
//! Multi-chain smart contract event monitoring: tail event logs from
//! EVM-compatible chains, decode them against registered ABIs, and
//! deliver them to handlers with at-least-once semantics and resumable
//! progress across restarts.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use chainwatch::{Backoff, ChainWatch, EvmClient, FileCursor, Query};
//!
//! # async fn example() -> Result<(), chainwatch::Error> {
//! let watch = ChainWatch::builder()
//!     .cursor(Arc::new(FileCursor::new("progress.json")))
//!     .retry(Arc::new(Backoff::exponential(3)))
//!     .poll_interval(Duration::from_secs(2))
//!     .build();
//!
//! watch.add_chain(Arc::new(EvmClient::new("https://mainnet.infura.io/v3/KEY")))?;
//! watch.register_event("Transfer(address indexed from, address indexed to, uint256 value)")?;
//!
//! watch
//!     .watch_decoded("ethereum", Query::new(), |event| {
//!         println!("{event}");
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
mod orchestrator;
pub mod watch;

pub use config::{Config, PollerConfig};
pub use logging::init_tracing;
pub use orchestrator::{ChainWatch, ChainWatchBuilder};
pub use watch::{ErrorCallback, EventCallback, Watcher, WatcherState};

pub use chainwatch_abi::{
    AbiDecoder, BindError, DecodedEvent, Decoder, FromDecoded, RawDecoder, Value,
};
pub use chainwatch_core::{
    Address, Backoff, Batch, Broadcast, Callback, Chain, Channel, CircuitBreaker, CircuitState,
    Cursor, Error, FileCursor, Hash, Log, LogFilter, MemoryCursor, Middleware, Query, Strategy,
    Subscriber, Subscription,
};
pub use chainwatch_core::middleware::{Logger, Metrics, RateLimit};
pub use chainwatch_evm::EvmClient;
pub use chainwatch_rpc::{HttpTransport, RpcTransport, WsTransport};
