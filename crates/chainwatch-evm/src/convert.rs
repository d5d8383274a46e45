//! RPC log parsing.

use chainwatch_core::{Address, Error, Hash, Log};
use serde::{Deserialize, Serialize};

/// A raw EVM log as returned by `eth_getLogs` and log subscriptions.
///
/// Pending logs may carry null block/transaction fields; those parse to
/// zero values rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcLog {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: String,
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
    #[serde(rename = "blockHash", default)]
    pub block_hash: Option<String>,
    #[serde(rename = "transactionHash", default)]
    pub tx_hash: Option<String>,
    #[serde(rename = "transactionIndex", default)]
    pub tx_index: Option<String>,
    #[serde(rename = "logIndex", default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

impl RpcLog {
    /// Converts the RPC representation into the event model.
    pub fn into_log(self, chain_id: &str) -> Result<Log, Error> {
        let mut log = Log {
            chain: chain_id.to_string(),
            removed: self.removed,
            ..Default::default()
        };

        log.address = Address::from_hex(&self.address)?;

        log.topics = self
            .topics
            .iter()
            .map(|t| Hash::from_hex(t))
            .collect::<Result<Vec<_>, _>>()?;

        if !self.data.is_empty() && self.data != "0x" {
            log.data = decode_hex_blob(&self.data)?;
        }

        if let Some(n) = self.block_number.as_deref() {
            log.block_number = parse_hex_u64(n)?;
        }
        if let Some(h) = self.block_hash.as_deref() {
            log.block_hash = Hash::from_hex(h)?;
        }
        if let Some(h) = self.tx_hash.as_deref() {
            log.tx_hash = Hash::from_hex(h)?;
        }
        if let Some(n) = self.tx_index.as_deref() {
            log.tx_index = parse_hex_u64(n)? as u32;
        }
        if let Some(n) = self.log_index.as_deref() {
            log.log_index = parse_hex_u64(n)? as u32;
        }

        Ok(log)
    }
}

/// Parses a hex-encoded block number (`"0x..."`).
pub fn parse_hex_u64(s: &str) -> Result<u64, Error> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(digits, 16)
        .map_err(|e| Error::Connection(format!("invalid hex number {s:?}: {e}")))
}

fn decode_hex_blob(s: &str) -> Result<Vec<u8>, Error> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    hex::decode(digits).map_err(|e| Error::Connection(format!("invalid hex data: {e}")))
}
