use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;

use super::{DocumentStore, StoreError};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Last write time of a document, as RFC 3339.
    pub fn updated_at(&self, key: &str) -> Result<Option<String>, StoreError> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }
}

impl DocumentStore for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, document: &Value) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(document)?;
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO documents (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, serialized, now],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM documents WHERE key = ?1", params![key])?;
        Ok(())
    }
}
