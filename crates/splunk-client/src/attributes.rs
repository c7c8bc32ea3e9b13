//! Two-layer attribute cache backing every entity.
//!
//! The committed layer mirrors the last representation the server returned.
//! The pending layer holds local edits that have not been submitted yet and
//! overrides the committed layer on reads. Lookups resolve in the order
//! pending, committed, caller default.

use crate::error::{Result, SplunkError};
use crate::value::{Attributes, Value};

/// Committed attributes plus an overlay of uncommitted edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeCache {
    attributes: Attributes,
    pending: Attributes,
}

impl AttributeCache {
    /// Create a cache seeded with server-confirmed attributes.
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            pending: Attributes::new(),
        }
    }

    /// Look up a key, failing with `NotFound` if neither layer has it.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.lookup(key)
            .ok_or_else(|| SplunkError::NotFound(format!("attribute `{key}`")))
    }

    /// Look up a key, falling back to `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.lookup(key).unwrap_or(default)
    }

    /// Look up a key without raising.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.pending.get(key).or_else(|| self.attributes.get(key))
    }

    /// Stage an edit. Nothing is sent until the owning entity is updated.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.pending.insert(key.into(), value.into());
    }

    /// Whether any edit is staged.
    pub fn is_dirty(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Replace the committed layer with a fresh server representation.
    ///
    /// Pending edits survive; use [`discard`](Self::discard) to drop them.
    pub fn refresh(&mut self, attributes: Attributes) {
        self.attributes = attributes;
    }

    /// Drop all staged edits.
    pub fn discard(&mut self) {
        self.pending.clear();
    }

    /// Swap in the server's post-update representation and clear pending
    /// edits in one step.
    pub fn commit(&mut self, attributes: Attributes) {
        self.attributes = attributes;
        self.pending.clear();
    }

    /// Server-confirmed attributes.
    pub fn committed(&self) -> &Attributes {
        &self.attributes
    }

    /// Staged edits.
    pub fn pending(&self) -> &Attributes {
        &self.pending
    }
}
