use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result of a single write against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// A new document was created
    Inserted,
    /// An existing document changed
    Modified,
    /// A document matched but the write left it as it was
    Unchanged,
    /// No document matched an identity-only update
    NotMatched,
}

/// Errors raised by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Backend(String),
}

/// A partial update: fields to overwrite plus values to add to array fields.
///
/// `add_to_set` has set semantics: a value already present in the array
/// (by full equality) is not added again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentUpdate {
    pub set: Map<String, Value>,
    pub add_to_set: Map<String, Value>,
}

impl DocumentUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite `field` with `value`
    pub fn set(mut self, field: &str, value: impl Serialize) -> Result<Self, StoreError> {
        self.set.insert(field.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Append `value` to the array `field` unless an equal value is already there
    pub fn add_to_set(mut self, field: &str, value: impl Serialize) -> Result<Self, StoreError> {
        self.add_to_set
            .insert(field.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.add_to_set.is_empty()
    }
}
