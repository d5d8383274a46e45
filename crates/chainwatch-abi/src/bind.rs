//! Binding decoded events into user structs.
//!
//! Instead of runtime reflection, binding goes through typed accessors
//! with an explicit [`FromDecoded`] implementation per event:
//!
//! ```
//! use alloy_primitives::U256;
//! use chainwatch_abi::{BindError, DecodedEvent, FromDecoded};
//! use chainwatch_core::Address;
//!
//! struct Transfer {
//!     from: Address,
//!     to: Address,
//!     value: U256,
//! }
//!
//! impl FromDecoded for Transfer {
//!     fn from_decoded(event: &DecodedEvent) -> Result<Self, BindError> {
//!         Ok(Transfer {
//!             from: event.require_address("from")?,
//!             to: event.require_address("to")?,
//!             value: event.require_uint("value")?,
//!         })
//!     }
//! }
//! ```

use alloy_primitives::{I256, U256};
use chainwatch_core::{Address, Hash};

use crate::decoder::DecodedEvent;
use crate::error::BindError;
use crate::value::Value;

/// A type constructible from a decoded event.
pub trait FromDecoded: Sized {
    fn from_decoded(event: &DecodedEvent) -> Result<Self, BindError>;
}

impl DecodedEvent {
    /// Binds the event into a user struct.
    pub fn bind<T: FromDecoded>(&self) -> Result<T, BindError> {
        T::from_decoded(self)
    }

    /// Looks up a parameter by name, falling back to a case-insensitive
    /// match when the exact name is absent.
    pub fn param(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.params.get(name) {
            return Some(value);
        }
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    fn require(&self, name: &str) -> Result<&Value, BindError> {
        self.param(name)
            .ok_or_else(|| BindError::MissingParam(name.to_string()))
    }

    pub fn require_address(&self, name: &str) -> Result<Address, BindError> {
        let value = self.require(name)?;
        value.as_address().ok_or_else(|| incompatible(name, "address", value))
    }

    pub fn require_hash(&self, name: &str) -> Result<Hash, BindError> {
        let value = self.require(name)?;
        value.as_hash().ok_or_else(|| incompatible(name, "hash", value))
    }

    pub fn require_uint(&self, name: &str) -> Result<U256, BindError> {
        let value = self.require(name)?;
        value.as_uint().ok_or_else(|| incompatible(name, "uint", value))
    }

    pub fn require_int(&self, name: &str) -> Result<I256, BindError> {
        let value = self.require(name)?;
        value.as_int().ok_or_else(|| incompatible(name, "int", value))
    }

    /// Big integers narrow to `u64` by truncation.
    pub fn require_u64(&self, name: &str) -> Result<u64, BindError> {
        let value = self.require(name)?;
        value.as_u64().ok_or_else(|| incompatible(name, "uint", value))
    }

    /// Big integers narrow to `i64` by truncation.
    pub fn require_i64(&self, name: &str) -> Result<i64, BindError> {
        let value = self.require(name)?;
        value.as_i64().ok_or_else(|| incompatible(name, "int", value))
    }

    pub fn require_bool(&self, name: &str) -> Result<bool, BindError> {
        let value = self.require(name)?;
        value.as_bool().ok_or_else(|| incompatible(name, "bool", value))
    }

    /// String parameters bind directly; every other value binds as its
    /// display form (addresses and hashes as hex, integers as decimal).
    pub fn require_string(&self, name: &str) -> Result<String, BindError> {
        let value = self.require(name)?;
        Ok(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Byte sequences bind directly; hashes bind as their 32 bytes.
    pub fn require_bytes(&self, name: &str) -> Result<Vec<u8>, BindError> {
        let value = self.require(name)?;
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Hash(h) => Ok(h.as_bytes().to_vec()),
            other => Err(incompatible(name, "bytes", other)),
        }
    }
}

fn incompatible(name: &str, expected: &'static str, actual: &Value) -> BindError {
    BindError::Incompatible {
        param: name.to_string(),
        expected,
        actual: actual.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{AbiDecoder, Decoder};
    use chainwatch_core::Log;

    struct Transfer {
        from: Address,
        to: Address,
        value: U256,
    }

    impl FromDecoded for Transfer {
        fn from_decoded(event: &DecodedEvent) -> Result<Self, BindError> {
            Ok(Transfer {
                from: event.require_address("from")?,
                to: event.require_address("to")?,
                value: event.require_uint("value")?,
            })
        }
    }

    fn transfer_event() -> DecodedEvent {
        let decoder = AbiDecoder::new();
        decoder
            .register("Transfer(address indexed from, address indexed to, uint256 value)")
            .unwrap();
        let sig =
            Hash::from_hex("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
                .unwrap();
        let mut data = [0u8; 32];
        data[24..].copy_from_slice(&1_000_000u64.to_be_bytes());
        let log = Log {
            topics: vec![sig, Hash::from_hex("0x0a").unwrap(), Hash::from_hex("0x0b").unwrap()],
            data: data.to_vec(),
            ..Default::default()
        };
        decoder.decode(&log).unwrap()
    }

    #[test]
    fn binds_into_struct() {
        let event = transfer_event();
        let transfer: Transfer = event.bind().unwrap();
        assert_eq!(transfer.from, Address::from_hex("0x0a").unwrap());
        assert_eq!(transfer.to, Address::from_hex("0x0b").unwrap());
        assert_eq!(transfer.value, U256::from(1_000_000u64));
    }

    #[test]
    fn lookup_falls_back_to_case_insensitive() {
        let event = transfer_event();
        assert!(event.param("From").is_some());
        assert!(event.param("VALUE").is_some());
        assert!(event.param("missing").is_none());
    }

    #[test]
    fn narrows_by_truncation() {
        let event = transfer_event();
        assert_eq!(event.require_u64("value").unwrap(), 1_000_000);
    }

    #[test]
    fn string_coercion_uses_display_form() {
        let event = transfer_event();
        assert_eq!(
            event.require_string("from").unwrap(),
            "0x000000000000000000000000000000000000000a"
        );
    }

    #[test]
    fn missing_param_errors() {
        let event = transfer_event();
        assert!(matches!(
            event.require_address("nobody"),
            Err(BindError::MissingParam(_))
        ));
    }

    #[test]
    fn incompatible_coercion_errors() {
        let event = transfer_event();
        assert!(matches!(
            event.require_bool("value"),
            Err(BindError::Incompatible { .. })
        ));
        assert!(matches!(
            event.require_bytes("value"),
            Err(BindError::Incompatible { .. })
        ));
    }
}
