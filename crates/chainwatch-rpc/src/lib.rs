//! # chainwatch-rpc
//!
//! JSON-RPC 2.0 transports for chainwatch:
//!
//! - [`RpcTransport`] — the trait every transport implements
//! - [`HttpTransport`] — request/response over HTTP, with optional
//!   circuit-breaker gating
//! - [`WsTransport`] — duplex WebSocket with reconnect, request
//!   multiplexing, and `eth_subscribe` subscription management

pub mod error;
pub mod http;
pub mod request;
pub mod subscriptions;
pub mod transport;
pub mod ws;

pub use error::TransportError;
pub use http::HttpTransport;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use transport::{call, RawSubscription, RpcTransport};
pub use ws::{WsConfig, WsTransport};
