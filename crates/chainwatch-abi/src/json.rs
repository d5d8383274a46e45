//! Standard JSON ABI parsing.
//!
//! Accepts full contract ABIs (arrays of entries) or single event
//! entries. Non-event entries are skipped; tuple inputs are resolved
//! recursively into canonical `(t1,t2,…)` type strings.

use serde::Deserialize;

use crate::error::AbiError;
use crate::signature::{ParsedEvent, ParsedParam};
use crate::types::ParamType;

/// One entry of a JSON ABI array.
#[derive(Debug, Clone, Deserialize)]
pub struct AbiEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<AbiInput>,
    #[serde(default)]
    pub anonymous: bool,
}

/// One input parameter of a JSON ABI entry.
#[derive(Debug, Clone, Deserialize)]
pub struct AbiInput {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub indexed: bool,
    /// Component types for tuple inputs.
    #[serde(default)]
    pub components: Vec<AbiInput>,
}

/// Parses a full JSON ABI and returns its event definitions.
pub fn parse_abi(json: &[u8]) -> Result<Vec<ParsedEvent>, AbiError> {
    let entries: Vec<AbiEntry> = serde_json::from_slice(json)?;

    let mut events = Vec::new();
    for entry in entries {
        if entry.kind != "event" {
            continue;
        }
        events.push(entry_to_event(entry)?);
    }
    Ok(events)
}

/// Parses a single JSON ABI event entry.
pub fn parse_abi_event(json: &[u8]) -> Result<ParsedEvent, AbiError> {
    let entry: AbiEntry = serde_json::from_slice(json)?;
    if !entry.kind.is_empty() && entry.kind != "event" {
        return Err(AbiError::NotAnEvent(entry.kind));
    }
    entry_to_event(entry)
}

fn entry_to_event(entry: AbiEntry) -> Result<ParsedEvent, AbiError> {
    if entry.name.is_empty() {
        return Err(AbiError::MissingEventName);
    }

    let mut params = Vec::with_capacity(entry.inputs.len());
    for input in &entry.inputs {
        let canonical = resolve_type(input);
        params.push(ParsedParam {
            kind: ParamType::parse(&canonical)?,
            name: input.name.clone(),
            indexed: input.indexed,
        });
    }

    Ok(ParsedEvent {
        name: entry.name,
        params,
    })
}

/// Converts a JSON ABI input to its canonical Solidity type string.
///
/// Tuples keep any array suffix from the declared type: a
/// `tuple[2]` with components `uint256, address` becomes
/// `(uint256,address)[2]`.
fn resolve_type(input: &AbiInput) -> String {
    if input.components.is_empty() {
        return input.kind.clone();
    }

    let (_, suffix) = match input.kind.find('[') {
        Some(idx) => input.kind.split_at(idx),
        None => (input.kind.as_str(), ""),
    };
    let components: Vec<String> = input.components.iter().map(resolve_type).collect();
    format!("({}){}", components.join(","), suffix)
}
