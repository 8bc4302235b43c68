use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::Value;

use super::{DocumentStore, StoreError};

/// Volatile store holding serialized documents, with an optional byte quota
/// over the sum of key and value lengths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(limit: usize) -> Self {
        Self {
            entries: RefCell::new(BTreeMap::new()),
            quota: Some(limit),
        }
    }

    /// Serialized form of a stored document.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Stores raw text without validation, as a foreign writer could.
    pub fn insert_raw(&self, key: &str, raw: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), raw.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    fn used_bytes_except(&self, key: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(existing, _)| existing.as_str() != key)
            .map(|(existing, value)| existing.len() + value.len())
            .sum()
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self.entries.borrow().get(key) {
            Some(raw) => Ok(Some(serde_json::from_str(raw)?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(document)?;
        if let Some(limit) = self.quota {
            let needed = self.used_bytes_except(key) + key.len() + serialized.len();
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }
        self.entries
            .borrow_mut()
            .insert(key.to_string(), serialized);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
