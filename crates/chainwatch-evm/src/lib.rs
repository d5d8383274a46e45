//! # chainwatch-evm
//!
//! The EVM-compatible chain driver: `eth_blockNumber`, `eth_getLogs`,
//! and `eth_subscribe("logs")` over a chainwatch-rpc transport, with
//! RPC logs parsed into the chainwatch event model.
//!
//! BSC, Polygon, Arbitrum and other EVM-compatible chains reuse this
//! driver with a custom chain id via [`EvmClient::with_id`].

pub mod client;
pub mod convert;

pub use client::EvmClient;
pub use convert::{parse_hex_u64, RpcLog};
