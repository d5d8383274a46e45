//! # chainwatch-abi
//!
//! Event signature parsing and ABI log decoding: a Keccak-keyed schema
//! registry, Solidity signature and JSON ABI parsers, and a decoder
//! implementing the EVM head/tail binary layout including dynamic
//! types and two's-complement integers.

mod bind;
pub mod decoder;
pub mod error;
pub mod json;
pub mod schema;
pub mod signature;
pub mod types;
pub mod value;

pub use bind::FromDecoded;
pub use decoder::{AbiDecoder, DecodedEvent, Decoder, RawDecoder};
pub use error::{AbiError, BindError, DecodeError};
pub use schema::{EventDef, ParamDef, SchemaRegistry};
pub use signature::{keccak256, parse_event_signature, signature_hash, ParsedEvent, ParsedParam};
pub use types::ParamType;
pub use value::Value;
