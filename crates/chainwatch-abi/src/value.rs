//! Decoded parameter values.

use std::fmt;

use alloy_primitives::{I256, U256};
use chainwatch_core::{Address, Hash};

/// A decoded event parameter, tagged by semantic type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 20-byte address.
    Address(Address),
    /// 32-byte hash. Also used for indexed dynamic parameters, which
    /// the chain stores as the keccak256 of their encoding.
    Hash(Hash),
    /// Unsigned 256-bit integer.
    Uint(U256),
    /// Signed 256-bit two's-complement integer.
    Int(I256),
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Byte sequence (`bytes`, `bytesN`, or undecodable payloads).
    Bytes(Vec<u8>),
    /// Ordered sequence: arrays and tuple components.
    Array(Vec<Value>),
}

impl Value {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            Value::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<Hash> {
        match self {
            Value::Hash(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Narrows a big integer to `u64` by truncation (low 64 bits).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(v.as_limbs()[0]),
            Value::Int(v) => Some(v.into_raw().as_limbs()[0]),
            _ => None,
        }
    }

    /// Narrows a big integer to `i64` by truncation (low 64 bits).
    pub fn as_i64(&self) -> Option<i64> {
        self.as_u64().map(|v| v as i64)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    /// A short tag naming the semantic type, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Address(_) => "address",
            Value::Hash(_) => "hash",
            Value::Uint(_) => "uint",
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
        }
    }

    /// A JSON-friendly representation: addresses, hashes, and bytes as
    /// hex strings, big integers as decimal strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Address(a) => serde_json::Value::String(a.to_hex()),
            Value::Hash(h) => serde_json::Value::String(h.to_hex()),
            Value::Uint(v) => serde_json::Value::String(v.to_string()),
            Value::Int(v) => serde_json::Value::String(v.to_string()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::Value::String(format!("0x{}", hex::encode(b))),
            Value::Array(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Address(a) => write!(f, "{a}"),
            Value::Hash(h) => write!(f, "{h}"),
            Value::Uint(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Array(values) => {
                let parts: Vec<String> = values.iter().map(Value::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
        }
    }
}
