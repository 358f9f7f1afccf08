//! `localStorage`-backed consent store
//!
//! Maps the browser storage API onto the core `ConsentStore` trait. Every
//! failure mode (no window, storage disabled by policy, quota errors) is
//! reported as a typed `StoreError`; the core degrades read errors to
//! "no prior decision".

use consent_engine::{ConsentStore, StoreError};
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Consent store over `window.localStorage`.
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    /// Acquire the browser's local storage, if available.
    pub fn new() -> Result<Self, StoreError> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::Unavailable("no window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StoreError::Unavailable(describe(&e)))?
            .ok_or_else(|| StoreError::Unavailable("local storage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

impl ConsentStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage.get_item(key).map_err(|e| StoreError::Read {
            key: key.to_string(),
            reason: describe(&e),
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                reason: describe(&e),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError::Write {
                key: key.to_string(),
                reason: describe(&e),
            })
    }
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}
