//! The event model: addresses, hashes, and event log records.

use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A 20-byte EVM-compatible contract address.
///
/// Equality is byte-wise; the canonical display form is lowercase hex
/// with a `0x` prefix.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

/// A 32-byte hash (block hash, transaction hash, log topic).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hash(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Parses a hex string (with or without the `0x` prefix).
    ///
    /// Shorter inputs are left-padded with zeros; longer inputs keep the
    /// rightmost 20 bytes.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = decode_hex(s).map_err(|e| Error::InvalidAddress(format!("{s:?}: {e}")))?;
        let mut out = [0u8; 20];
        copy_right_aligned(&mut out, &bytes);
        Ok(Address(out))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// The `0x`-prefixed lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    /// Parses a hex string (with or without the `0x` prefix).
    ///
    /// Shorter inputs are left-padded with zeros; longer inputs keep the
    /// rightmost 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = decode_hex(s).map_err(|e| Error::InvalidHash(format!("{s:?}: {e}")))?;
        let mut out = [0u8; 32];
        copy_right_aligned(&mut out, &bytes);
        Ok(Hash(out))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// The `0x`-prefixed lowercase hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A single event log emitted by a smart contract.
///
/// Logs are immutable once produced by a chain driver; watchers and
/// middleware hand them over by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// Which chain this log came from.
    pub chain: String,
    /// The contract address that emitted the event.
    pub address: Address,
    /// Indexed event parameters; `topics[0]` is conventionally the
    /// event signature hash.
    pub topics: Vec<Hash>,
    /// ABI-encoded non-indexed event parameters.
    pub data: Vec<u8>,
    /// Block in which this log was emitted.
    pub block_number: u64,
    /// Hash of the containing block.
    pub block_hash: Hash,
    /// Transaction that produced this log.
    pub tx_hash: Hash,
    /// The transaction's position within the block.
    pub tx_index: u32,
    /// The log's position within the block.
    pub log_index: u32,
    /// Whether this log was reverted by a chain reorganization.
    pub removed: bool,
    /// Block timestamp, when the driver knows it.
    pub timestamp: Option<SystemTime>,
}

impl Log {
    /// Returns `topics[0]` (the event signature hash), or the zero hash
    /// if the log has no topics.
    pub fn event_signature(&self) -> Hash {
        self.topics.first().copied().unwrap_or(Hash::ZERO)
    }
}

/// A collection of logs fetched together, with the block range they span.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub logs: Vec<Log>,
    pub from_block: u64,
    pub to_block: u64,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

/// Decodes a hex string, tolerating a missing prefix and odd length.
fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if s.len() % 2 != 0 {
        hex::decode(format!("0{s}"))
    } else {
        hex::decode(s)
    }
}

/// Copies `src` into `dst` right-aligned: short inputs are left-padded,
/// long inputs keep their rightmost bytes.
fn copy_right_aligned(dst: &mut [u8], src: &[u8]) {
    if src.len() >= dst.len() {
        dst.copy_from_slice(&src[src.len() - dst.len()..]);
    } else {
        let start = dst.len() - src.len();
        dst[start..].copy_from_slice(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_roundtrip() {
        let hex = "0xd8da6bf26964af9d7eed9e03e53415d37aa96045";
        let addr = Address::from_hex(hex).unwrap();
        assert_eq!(addr.to_hex(), hex);
        assert_eq!(addr.to_string(), hex);
    }

    #[test]
    fn hash_hex_roundtrip() {
        let hex = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";
        let h = Hash::from_hex(hex).unwrap();
        assert_eq!(h.to_hex(), hex);
    }

    #[test]
    fn short_input_is_left_padded() {
        let addr = Address::from_hex("0xa").unwrap();
        assert_eq!(addr.0[19], 0x0a);
        assert!(addr.0[..19].iter().all(|b| *b == 0));

        let h = Hash::from_hex("0x1").unwrap();
        assert_eq!(h.0[31], 0x01);
    }

    #[test]
    fn long_input_keeps_rightmost_bytes() {
        let addr =
            Address::from_hex("0x1111d8da6bf26964af9d7eed9e03e53415d37aa96045").unwrap();
        assert_eq!(addr.to_hex(), "0xd8da6bf26964af9d7eed9e03e53415d37aa96045");
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(matches!(
            Address::from_hex("0xzz"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(Hash::from_hex("0xzz"), Err(Error::InvalidHash(_))));
    }

    #[test]
    fn event_signature_of_empty_topics_is_zero() {
        let log = Log::default();
        assert_eq!(log.event_signature(), Hash::ZERO);

        let sig = Hash::from_hex("0x01").unwrap();
        let log = Log {
            topics: vec![sig],
            ..Default::default()
        };
        assert_eq!(log.event_signature(), sig);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let addr = Address::from_hex("0x0a").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(
            json,
            "\"0x000000000000000000000000000000000000000a\""
        );
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn batch_len() {
        let batch = Batch {
            logs: vec![Log::default()],
            from_block: 1,
            to_block: 2,
        };
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
    }
}
