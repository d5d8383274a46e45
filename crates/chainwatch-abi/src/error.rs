//! Error types for signature parsing, decoding, and struct binding.

use chainwatch_core::{Error, Hash};
use thiserror::Error;

/// Errors raised while parsing event signatures or JSON ABIs.
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("malformed event signature: {0:?}")]
    MalformedSignature(String),

    #[error("empty event name in signature: {0:?}")]
    EmptyEventName(String),

    #[error("empty parameter in signature: {0:?}")]
    EmptyParameter(String),

    #[error("unknown type: {0:?}")]
    UnknownType(String),

    #[error("JSON ABI entry has type {0:?}, expected \"event\"")]
    NotAnEvent(String),

    #[error("JSON ABI event entry has no name")]
    MissingEventName,

    #[error("JSON ABI parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<AbiError> for Error {
    fn from(err: AbiError) -> Self {
        Error::InvalidAbi(err.to_string())
    }
}

/// Errors raised while decoding a single event log.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log has no topics")]
    NoTopics,

    #[error("unknown event signature {0}")]
    UnknownSignature(Hash),
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err.to_string())
    }
}

/// Errors raised while binding decoded parameters into a user struct.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("missing parameter: {0}")]
    MissingParam(String),

    #[error("parameter {param} is incompatible: expected {expected}, got {actual}")]
    Incompatible {
        param: String,
        expected: &'static str,
        actual: &'static str,
    },
}
