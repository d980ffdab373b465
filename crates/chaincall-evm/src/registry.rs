//! Method registry: the indexed, read-only view of one contract ABI.
//!
//! Built once from a list of fragments and shared behind `Arc` by every
//! contract handle that uses the ABI. Lookups never allocate beyond the key.

use alloy_json_abi::JsonAbi;
use alloy_primitives::B256;
use chaincall_core::{
    error::AbiError,
    fragment::{Fragment, FragmentKind},
    json::{fragments_from_json_abi, parse_abi},
};
use indexmap::IndexMap;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Indexed ABI of one contract.
///
/// Invariants, enforced at construction:
/// - no two fragments of the same kind share a canonical signature
/// - no two functions share a selector
/// - at most one constructor
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    /// name → overloads, in declaration order
    functions: IndexMap<String, Vec<Arc<Fragment>>>,
    /// canonical signature → function
    by_signature: HashMap<String, Arc<Fragment>>,
    by_selector: HashMap<[u8; 4], Arc<Fragment>>,
    /// canonical signature → event
    events: IndexMap<String, Arc<Fragment>>,
    /// canonical signature → error
    errors: IndexMap<String, Arc<Fragment>>,
    constructor: Option<Arc<Fragment>>,
}

impl MethodRegistry {
    /// Build a registry from parsed fragments.
    pub fn new(fragments: impl IntoIterator<Item = Fragment>) -> Result<Self, AbiError> {
        let mut registry = Self::default();
        for fragment in fragments {
            registry.insert(Arc::new(fragment))?;
        }
        debug!(
            functions = registry.by_signature.len(),
            events = registry.events.len(),
            errors = registry.errors.len(),
            constructor = registry.constructor.is_some(),
            "method registry built"
        );
        Ok(registry)
    }

    /// Build from a JSON ABI (array, artifact object, or array of
    /// human-readable strings).
    pub fn from_json(abi_json: &str) -> Result<Self, AbiError> {
        Self::new(parse_abi(abi_json)?)
    }

    /// Build from human-readable fragments such as
    /// `"function transfer(address to, uint256 amount) returns (bool)"`.
    pub fn from_human_readable<I, S>(fragments: I) -> Result<Self, AbiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = fragments
            .into_iter()
            .map(|s| Fragment::parse(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(parsed)
    }

    /// Build from an already-parsed `alloy_json_abi::JsonAbi`.
    pub fn from_json_abi(abi: &JsonAbi) -> Result<Self, AbiError> {
        Self::new(fragments_from_json_abi(abi)?)
    }

    fn insert(&mut self, fragment: Arc<Fragment>) -> Result<(), AbiError> {
        let signature = fragment.signature();
        let duplicate = || AbiError::DuplicateFragment {
            signature: format!("{} {signature}", fragment.kind),
        };

        match fragment.kind {
            FragmentKind::Function => {
                if self.by_signature.contains_key(&signature) {
                    return Err(duplicate());
                }
                let selector = fragment.selector();
                if let Some(existing) = self.by_selector.get(&selector) {
                    return Err(AbiError::DuplicateFragment {
                        signature: format!(
                            "{signature} (selector 0x{} already used by {})",
                            hex::encode(selector),
                            existing.signature()
                        ),
                    });
                }
                self.by_selector.insert(selector, Arc::clone(&fragment));
                self.by_signature.insert(signature, Arc::clone(&fragment));
                self.functions
                    .entry(fragment.name.clone())
                    .or_default()
                    .push(fragment);
            }
            FragmentKind::Event => {
                if self.events.contains_key(&signature) {
                    return Err(duplicate());
                }
                self.events.insert(signature, fragment);
            }
            FragmentKind::Error => {
                if self.errors.contains_key(&signature) {
                    return Err(duplicate());
                }
                self.errors.insert(signature, fragment);
            }
            FragmentKind::Constructor => {
                if self.constructor.is_some() {
                    return Err(duplicate());
                }
                self.constructor = Some(fragment);
            }
        }
        Ok(())
    }

    /// All overloads of a function name, in declaration order. Empty if none.
    pub fn functions_named(&self, name: &str) -> &[Arc<Fragment>] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Function by canonical signature (already normalized).
    pub fn function_by_signature(&self, signature: &str) -> Option<&Arc<Fragment>> {
        self.by_signature.get(signature)
    }

    pub fn function_by_selector(&self, selector: [u8; 4]) -> Option<&Arc<Fragment>> {
        self.by_selector.get(&selector)
    }

    /// Every function, grouped by name in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Arc<Fragment>> {
        self.functions.values().flatten()
    }

    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn events(&self) -> impl Iterator<Item = &Arc<Fragment>> {
        self.events.values()
    }

    /// Non-anonymous event whose topic 0 matches.
    pub fn event_by_topic(&self, topic: B256) -> Option<&Arc<Fragment>> {
        self.events
            .values()
            .find(|e| !e.anonymous && e.topic() == topic)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Arc<Fragment>> {
        self.errors.values()
    }

    /// Custom error by the 4-byte selector at the head of revert data.
    pub fn error_by_selector(&self, selector: [u8; 4]) -> Option<&Arc<Fragment>> {
        self.errors.values().find(|e| e.selector() == selector)
    }

    pub fn constructor(&self) -> Option<&Arc<Fragment>> {
        self.constructor.as_ref()
    }

    /// Total number of fragments of every kind.
    pub fn len(&self) -> usize {
        self.by_signature.len()
            + self.events.len()
            + self.errors.len()
            + usize::from(self.constructor.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
