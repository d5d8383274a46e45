//! Event log decoding.
//!
//! `AbiDecoder` matches a log's `topics[0]` against registered event
//! definitions and decodes indexed parameters from topics and
//! non-indexed parameters from the data blob.
//!
//! The data blob is the ABI encoding of the tuple of non-indexed
//! parameters: a head section of one 32-byte word per parameter
//! (inline value for static types, byte offset into the tail for
//! dynamic ones), followed by the tail holding dynamic payloads.
//! Decoding is lenient: malformed offsets, lengths, and counts clamp
//! to the available bytes and surface truncated values rather than
//! failing the whole log.

use std::collections::HashMap;
use std::fmt;

use alloy_primitives::{I256, U256};
use chainwatch_core::{Address, Hash, Log};

use crate::error::{AbiError, DecodeError};
use crate::json;
use crate::schema::{EventDef, ParamDef, SchemaRegistry};
use crate::signature::parse_event_signature;
use crate::types::ParamType;
use crate::value::Value;

const WORD: usize = 32;

/// Decodes raw event logs into structured events.
pub trait Decoder: Send + Sync {
    /// Decodes a log against the registered event definitions.
    fn decode(&self, log: &Log) -> Result<DecodedEvent, DecodeError>;

    /// Registers a Solidity-style event signature, e.g.
    /// `"Transfer(address indexed from, address indexed to, uint256 value)"`.
    fn register(&self, signature: &str) -> Result<(), AbiError>;

    /// Registers every event definition found in a standard JSON ABI.
    fn register_json(&self, abi: &[u8]) -> Result<(), AbiError>;
}

/// The decoded representation of an event log.
#[derive(Debug, Clone)]
pub struct DecodedEvent {
    /// Event name, e.g. `"Transfer"`.
    pub name: String,
    /// Canonical signature, e.g. `"Transfer(address,address,uint256)"`.
    pub signature: String,
    /// Decoded indexed (topic) parameters.
    pub indexed: HashMap<String, Value>,
    /// Decoded non-indexed (data) parameters.
    pub data: HashMap<String, Value>,
    /// All decoded parameters; the union of `indexed` and `data`.
    pub params: HashMap<String, Value>,
    /// The original unmodified log.
    pub raw: Log,
}

impl DecodedEvent {
    /// A JSON-serializable view: event envelope plus the decoded maps,
    /// with hex-encoded addresses/hashes/bytes and decimal big integers.
    pub fn to_json(&self) -> serde_json::Value {
        let map = |values: &HashMap<String, Value>| -> serde_json::Value {
            values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<serde_json::Map<String, serde_json::Value>>()
                .into()
        };

        serde_json::json!({
            "event": self.name,
            "signature": self.signature,
            "chain": self.raw.chain,
            "blockNumber": self.raw.block_number,
            "txHash": self.raw.tx_hash.to_hex(),
            "logIndex": self.raw.log_index,
            "address": self.raw.address.to_hex(),
            "removed": self.raw.removed,
            "params": map(&self.params),
            "indexed": map(&self.indexed),
            "data": map(&self.data),
        })
    }
}

impl fmt::Display for DecodedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        let mut keys: Vec<&String> = self.params.keys().collect();
        keys.sort();
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, self.params[*key])?;
        }
        write!(
            f,
            ") chain={} block={} tx={}",
            self.raw.chain, self.raw.block_number, self.raw.tx_hash
        )
    }
}

/// ABI decoder backed by a [`SchemaRegistry`].
///
/// Thread-safe: registration and decoding may run concurrently.
#[derive(Default)]
pub struct AbiDecoder {
    schema: SchemaRegistry,
}

impl AbiDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a single event entry from a JSON ABI.
    pub fn register_json_event(&self, entry: &[u8]) -> Result<(), AbiError> {
        let parsed = json::parse_abi_event(entry)?;
        self.schema.add(EventDef::from(&parsed));
        Ok(())
    }

    /// Whether a definition is registered for the given signature hash.
    pub fn recognizes(&self, sig_hash: &Hash) -> bool {
        self.schema.contains(sig_hash)
    }
}

impl Decoder for AbiDecoder {
    fn decode(&self, log: &Log) -> Result<DecodedEvent, DecodeError> {
        if log.topics.is_empty() {
            return Err(DecodeError::NoTopics);
        }
        let sig_hash = log.topics[0];
        let def = self
            .schema
            .lookup(&sig_hash)
            .ok_or(DecodeError::UnknownSignature(sig_hash))?;

        let mut decoded = DecodedEvent {
            name: def.name.clone(),
            signature: def.signature.clone(),
            indexed: HashMap::new(),
            data: HashMap::new(),
            params: HashMap::new(),
            raw: log.clone(),
        };

        // Indexed parameters map onto topics[1..]. Logs carrying fewer
        // topics than the definition declares are decoded as far as the
        // topics go.
        let mut topic_idx = 1usize;
        for input in def.inputs.iter().filter(|p| p.indexed) {
            if topic_idx >= log.topics.len() {
                break;
            }
            let name = if input.name.is_empty() {
                format!("arg{topic_idx}")
            } else {
                input.name.clone()
            };
            let value = decode_topic(&input.kind, &log.topics[topic_idx]);
            decoded.indexed.insert(name.clone(), value.clone());
            decoded.params.insert(name, value);
            topic_idx += 1;
        }

        // Non-indexed parameters come from the data blob, one head word
        // per parameter. Decoding stops once the head outruns the blob.
        let data_params: Vec<&ParamDef> = def.inputs.iter().filter(|p| !p.indexed).collect();
        for (i, param) in data_params.iter().enumerate() {
            let head = i * WORD;
            if head + WORD > log.data.len() {
                break;
            }
            let name = if param.name.is_empty() {
                format!("data{i}")
            } else {
                param.name.clone()
            };
            let word = read_word(&log.data, head);
            let value = if param.kind.is_dynamic() {
                let offset = word_to_usize(&word).min(log.data.len());
                decode_dynamic(&param.kind, &log.data, offset)
            } else {
                decode_word(&param.kind, &word)
            };
            decoded.data.insert(name.clone(), value.clone());
            decoded.params.insert(name, value);
        }

        Ok(decoded)
    }

    fn register(&self, signature: &str) -> Result<(), AbiError> {
        let parsed = parse_event_signature(signature)?;
        self.schema.add(EventDef::from(&parsed));
        Ok(())
    }

    fn register_json(&self, abi: &[u8]) -> Result<(), AbiError> {
        for parsed in json::parse_abi(abi)? {
            self.schema.add(EventDef::from(&parsed));
        }
        Ok(())
    }
}

/// Pass-through decoder that wraps logs without parsing.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl RawDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for RawDecoder {
    fn decode(&self, log: &Log) -> Result<DecodedEvent, DecodeError> {
        Ok(DecodedEvent {
            name: "raw".to_string(),
            signature: String::new(),
            indexed: HashMap::new(),
            data: HashMap::new(),
            params: HashMap::new(),
            raw: log.clone(),
        })
    }

    fn register(&self, _signature: &str) -> Result<(), AbiError> {
        Ok(())
    }

    fn register_json(&self, _abi: &[u8]) -> Result<(), AbiError> {
        Ok(())
    }
}

/// Decodes a single 32-byte topic.
///
/// Dynamic types (`string`, `bytes`, arrays, tuples) are stored in
/// topics as the keccak256 of their encoding; the original value is
/// unrecoverable, so the raw 32 bytes surface as a hash.
fn decode_topic(kind: &ParamType, topic: &Hash) -> Value {
    match kind {
        ParamType::String
        | ParamType::Bytes
        | ParamType::Array(_)
        | ParamType::FixedArray(..)
        | ParamType::Tuple(_) => Value::Hash(*topic),
        _ => decode_word(kind, &topic.0),
    }
}

/// Decodes a static type from one 32-byte word.
fn decode_word(kind: &ParamType, word: &[u8; WORD]) -> Value {
    match kind {
        ParamType::Address => Value::Address(Address(word[12..32].try_into().unwrap())),
        ParamType::Bool => Value::Bool(word[31] != 0),
        ParamType::Uint(_) => Value::Uint(U256::from_be_bytes(*word)),
        // Two's complement: bit 255 set means value = raw - 2^256.
        ParamType::Int(_) => Value::Int(I256::from_raw(U256::from_be_bytes(*word))),
        ParamType::FixedBytes(len) => Value::Bytes(word[..(*len).min(WORD)].to_vec()),
        // Dynamic types never reach here; surface the raw word.
        _ => Value::Hash(Hash(*word)),
    }
}

/// Decodes a dynamic type at `offset` into the blob.
fn decode_dynamic(kind: &ParamType, blob: &[u8], offset: usize) -> Value {
    match kind {
        ParamType::String => {
            let bytes = read_length_prefixed(blob, offset);
            match String::from_utf8(bytes) {
                Ok(s) => Value::String(s),
                // Invalid UTF-8 is preserved as raw bytes.
                Err(err) => Value::Bytes(err.into_bytes()),
            }
        }
        ParamType::Bytes => Value::Bytes(read_length_prefixed(blob, offset)),
        ParamType::Array(elem) => {
            let count = word_to_usize(&read_word(blob, offset));
            decode_entries(elem, blob, offset.saturating_add(WORD), count)
        }
        // No length word; the element area starts at the offset itself.
        ParamType::FixedArray(elem, n) => decode_entries(elem, blob, offset, *n),
        ParamType::Tuple(components) => {
            let region = &blob[offset.min(blob.len())..];
            decode_tuple(components, region)
        }
        _ => decode_word(kind, &read_word(blob, offset)),
    }
}

/// Decodes `count` array entries starting at `area`.
///
/// Static elements are packed 32-byte words; dynamic elements are
/// offsets relative to the element area. The count clamps to the words
/// actually present.
fn decode_entries(elem: &ParamType, blob: &[u8], area: usize, count: usize) -> Value {
    let region = &blob[area.min(blob.len())..];
    let count = count.min(region.len() / WORD);

    let mut values = Vec::with_capacity(count);
    for i in 0..count {
        let word = read_word(region, i * WORD);
        if elem.is_dynamic() {
            let offset = word_to_usize(&word).min(region.len());
            values.push(decode_dynamic(elem, region, offset));
        } else {
            values.push(decode_word(elem, &word));
        }
    }
    Value::Array(values)
}

/// Decodes a tuple laid out head/tail inside `region`; dynamic member
/// offsets are relative to the region start.
fn decode_tuple(components: &[ParamType], region: &[u8]) -> Value {
    let mut values = Vec::with_capacity(components.len());
    for (i, component) in components.iter().enumerate() {
        let word = read_word(region, i * WORD);
        if component.is_dynamic() {
            let offset = word_to_usize(&word).min(region.len());
            values.push(decode_dynamic(component, region, offset));
        } else {
            values.push(decode_word(component, &word));
        }
    }
    Value::Array(values)
}

/// Reads a 32-byte length word at `offset` followed by that many
/// content bytes, clamped to the blob.
fn read_length_prefixed(blob: &[u8], offset: usize) -> Vec<u8> {
    let len = word_to_usize(&read_word(blob, offset));
    let start = offset.saturating_add(WORD).min(blob.len());
    let end = start.saturating_add(len).min(blob.len());
    blob[start..end].to_vec()
}

/// Reads the 32-byte word at `offset`, zero-padding past the end of the
/// blob.
fn read_word(blob: &[u8], offset: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    if offset < blob.len() {
        let end = (offset + WORD).min(blob.len());
        word[..end - offset].copy_from_slice(&blob[offset..end]);
    }
    word
}

/// Interprets a word as an offset/length/count. Values beyond the u64
/// range saturate; callers clamp against the blob.
fn word_to_usize(word: &[u8; WORD]) -> usize {
    if word[..24].iter().any(|b| *b != 0) {
        return usize::MAX;
    }
    u64::from_be_bytes(word[24..32].try_into().unwrap()) as usize
}
