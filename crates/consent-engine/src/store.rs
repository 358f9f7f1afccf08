//! Key-value persistence boundary for consent decisions
//!
//! The durable state is three string-valued entries. Backends are injected
//! so the tracker can run against browser local storage in production and
//! an in-memory map in tests.

use std::collections::HashMap;

use crate::error::StoreError;

/// Storage key for the decision flag (`"true"` / `"false"`, absent = undecided).
pub const KEY_ACCEPTED: &str = "terms_accepted";
/// Storage key for the document version the decision applies to.
pub const KEY_VERSION: &str = "terms_version";
/// Storage key for the decision timestamp (RFC 3339).
pub const KEY_ACCEPTED_DATE: &str = "terms_accepted_date";

/// Durable string key-value storage for consent state.
pub trait ConsentStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store backed by a `HashMap`. Used in tests and anywhere no
/// durable backend exists; contents are lost when the store is dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsentStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
