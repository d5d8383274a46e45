//! The event schema registry: parsed definitions indexed by signature
//! hash for O(1) lookup from `topics[0]`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chainwatch_core::Hash;

use crate::signature::ParsedEvent;
use crate::types::ParamType;

/// A registered event definition.
#[derive(Debug, Clone)]
pub struct EventDef {
    /// Event name, e.g. `"Transfer"`.
    pub name: String,
    /// Canonical signature, e.g. `"Transfer(address,address,uint256)"`.
    pub signature: String,
    /// `keccak256(signature)`.
    pub sig_hash: Hash,
    /// Parameters in declaration order.
    pub inputs: Vec<ParamDef>,
}

/// A single parameter of an event definition.
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// Parameter name; empty when the ABI omits it.
    pub name: String,
    pub kind: ParamType,
    pub indexed: bool,
}

impl From<&ParsedEvent> for EventDef {
    fn from(parsed: &ParsedEvent) -> Self {
        let canonical = parsed.canonical();
        EventDef {
            name: parsed.name.clone(),
            sig_hash: parsed.signature_hash(),
            signature: canonical,
            inputs: parsed
                .params
                .iter()
                .map(|p| ParamDef {
                    name: p.name.clone(),
                    kind: p.kind.clone(),
                    indexed: p.indexed,
                })
                .collect(),
        }
    }
}

/// Thread-safe mapping from signature hash to event definition.
///
/// Read-mostly: lookups take the read lock, registration the write
/// lock. Re-registering a hash replaces the previous definition.
#[derive(Default)]
pub struct SchemaRegistry {
    events: RwLock<HashMap<Hash, Arc<EventDef>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under its signature hash.
    pub fn add(&self, def: EventDef) {
        self.events
            .write()
            .unwrap()
            .insert(def.sig_hash, Arc::new(def));
    }

    /// Finds the definition for a `topics[0]` hash.
    pub fn lookup(&self, sig_hash: &Hash) -> Option<Arc<EventDef>> {
        self.events.read().unwrap().get(sig_hash).cloned()
    }

    pub fn contains(&self, sig_hash: &Hash) -> bool {
        self.events.read().unwrap().contains_key(sig_hash)
    }

    pub fn len(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::parse_event_signature;

    #[test]
    fn add_and_lookup_by_signature_hash() {
        let registry = SchemaRegistry::new();
        let parsed =
            parse_event_signature("Transfer(address indexed from, address indexed to, uint256 value)")
                .unwrap();
        registry.add(EventDef::from(&parsed));

        let hash =
            Hash::from_hex("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
                .unwrap();
        let def = registry.lookup(&hash).unwrap();
        assert_eq!(def.name, "Transfer");
        assert_eq!(def.signature, "Transfer(address,address,uint256)");
        assert_eq!(def.sig_hash, hash);
        assert_eq!(def.inputs.len(), 3);
        assert!(def.inputs[0].indexed);
        assert!(!def.inputs[2].indexed);
    }

    #[test]
    fn unknown_hash_misses() {
        let registry = SchemaRegistry::new();
        assert!(registry.lookup(&Hash::ZERO).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn reregistration_replaces() {
        let registry = SchemaRegistry::new();
        let parsed = parse_event_signature("Transfer(address,address,uint256)").unwrap();
        registry.add(EventDef::from(&parsed));
        registry.add(EventDef::from(&parsed));
        assert_eq!(registry.len(), 1);
    }
}
