//! Solidity event signature parsing and Keccak-256 signature hashes.
//!
//! The canonical signature of an event is its name followed by the
//! parenthesized, comma-separated parameter types with no whitespace
//! and no parameter names, e.g.
//! `keccak256("Transfer(address,address,uint256)")
//! → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef`.

use chainwatch_core::Hash;
use tiny_keccak::{Hasher, Keccak};

use crate::error::AbiError;
use crate::types::{split_top_level, ParamType};

/// Computes the Keccak-256 digest of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    Hash(output)
}

/// Computes the signature hash of a canonical event signature.
pub fn signature_hash(canonical: &str) -> Hash {
    keccak256(canonical.as_bytes())
}

/// A parsed event signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
    pub name: String,
    pub params: Vec<ParsedParam>,
}

/// A single parameter of an event signature.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedParam {
    /// Canonical Solidity type string.
    pub kind: ParamType,
    /// Parameter name; empty when the signature omits it.
    pub name: String,
    pub indexed: bool,
}

impl ParsedEvent {
    /// The canonical signature: `Name(type1,type2,…)`.
    pub fn canonical(&self) -> String {
        let types: Vec<String> = self.params.iter().map(|p| p.kind.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// The Keccak-256 hash of the canonical signature.
    pub fn signature_hash(&self) -> Hash {
        signature_hash(&self.canonical())
    }
}

/// Parses a Solidity-style event signature.
///
/// Accepted forms:
/// - `"Transfer(address,address,uint256)"`
/// - `"Transfer(address indexed from, address indexed to, uint256 value)"`
///
/// Tuple types with nested parentheses are supported; the parameter
/// list is split only on top-level commas.
pub fn parse_event_signature(sig: &str) -> Result<ParsedEvent, AbiError> {
    let sig = sig.trim();

    let open = sig
        .find('(')
        .ok_or_else(|| AbiError::MalformedSignature(sig.to_string()))?;
    let close = sig
        .rfind(')')
        .ok_or_else(|| AbiError::MalformedSignature(sig.to_string()))?;
    if close <= open {
        return Err(AbiError::MalformedSignature(sig.to_string()));
    }

    let name = sig[..open].trim();
    if name.is_empty() {
        return Err(AbiError::EmptyEventName(sig.to_string()));
    }

    let params_str = sig[open + 1..close].trim();
    if params_str.is_empty() {
        return Ok(ParsedEvent {
            name: name.to_string(),
            params: Vec::new(),
        });
    }

    let mut params = Vec::new();
    for part in split_top_level(params_str) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        params.push(parse_param(part, sig)?);
    }

    Ok(ParsedEvent {
        name: name.to_string(),
        params,
    })
}

/// Parses one `TYPE ["indexed"] [NAME]` parameter.
///
/// The type may itself contain spaces only inside parentheses (tuple
/// component lists never do in canonical form), so splitting on
/// whitespace outside parens is safe.
fn parse_param(s: &str, sig: &str) -> Result<ParsedParam, AbiError> {
    let tokens = split_whitespace_top_level(s);
    if tokens.is_empty() {
        return Err(AbiError::EmptyParameter(sig.to_string()));
    }

    let kind = ParamType::parse(tokens[0])?;
    let mut indexed = false;
    let mut name = String::new();
    for token in &tokens[1..] {
        if *token == "indexed" {
            indexed = true;
        } else {
            name = (*token).to_string();
        }
    }

    Ok(ParsedParam { kind, name, indexed })
}

/// Splits on whitespace at parenthesis depth zero, so tuple types like
/// `(uint256, address)` stay in one token.
fn split_whitespace_top_level(s: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' => {
                depth += 1;
                start.get_or_insert(i);
            }
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => {
                if let Some(begin) = start.take() {
                    tokens.push(&s[begin..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }
    if let Some(begin) = start {
        tokens.push(&s[begin..]);
    }
    tokens
}
