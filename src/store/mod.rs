//! Durable key/document storage shared by the favourites registry, the
//! progress tracker and the theme preference.

mod memory;
mod sqlite;


use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage namespace used by the application.
pub mod keys {
    pub const FAVOURITES: &str = "favourites";
    pub const LISTENING_PROGRESS: &str = "listeningProgress";
    pub const THEME: &str = "theme";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage quota exceeded writing `{key}` ({needed} bytes needed, limit {limit})")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("sqlite storage failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A key/document store. Documents are JSON values; each key holds one
/// document and writes replace it whole.
pub trait DocumentStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn write(&self, key: &str, document: &Value) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Handle shared by every component writing to the same store.
pub type SharedStore = Rc<dyn DocumentStore>;

/// Result of a write-through. A failed write leaves the in-memory state
/// authoritative for the rest of the session.
#[derive(Debug)]
#[must_use]
pub enum WriteOutcome {
    Persisted,
    MemoryOnly(StoreError),
}

impl WriteOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    pub fn error(&self) -> Option<&StoreError> {
        match self {
            Self::Persisted => None,
            Self::MemoryOnly(err) => Some(err),
        }
    }
}

/// Reads and decodes a document. Unreadable or malformed documents are
/// reported as absent with a warning.
pub(crate) fn load_document<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Option<T> {
    let value = match store.read(key) {
        Ok(Some(value)) => value,
        Ok(None) => return None,
        Err(err) => {
            warn!(key = key, error = %err, "failed to read stored document, starting empty");
            return None;
        }
    };
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(key = key, error = %err, "ignoring malformed stored document");
            None
        }
    }
}

/// Reads a list document one entry at a time. Entries that fail to decode
/// are dropped with a warning; the rest survive.
pub(crate) fn load_list<T: DeserializeOwned>(store: &dyn DocumentStore, key: &str) -> Vec<T> {
    load_document::<Vec<Value>>(store, key)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entry| decode_entry(key, entry))
        .collect()
}

/// Map counterpart of [`load_list`].
pub(crate) fn load_map<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> BTreeMap<String, T> {
    load_document::<BTreeMap<String, Value>>(store, key)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, entry)| decode_entry(key, entry).map(|decoded| (id, decoded)))
        .collect()
}

fn decode_entry<T: DeserializeOwned>(key: &str, entry: Value) -> Option<T> {
    match serde_json::from_value(entry) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(key = key, error = %err, "dropping malformed stored entry");
            None
        }
    }
}

pub(crate) fn save_document<T: Serialize>(
    store: &dyn DocumentStore,
    key: &str,
    document: &T,
) -> WriteOutcome {
    let result = serde_json::to_value(document)
        .map_err(StoreError::from)
        .and_then(|value| store.write(key, &value));
    match result {
        Ok(()) => WriteOutcome::Persisted,
        Err(err) => {
            warn!(key = key, error = %err, "storage write dropped, keeping in-memory state");
            WriteOutcome::MemoryOnly(err)
        }
    }
}

pub(crate) fn remove_document(store: &dyn DocumentStore, key: &str) -> WriteOutcome {
    match store.remove(key) {
        Ok(()) => WriteOutcome::Persisted,
        Err(err) => {
            warn!(key = key, error = %err, "storage removal failed");
            WriteOutcome::MemoryOnly(err)
        }
    }
}
