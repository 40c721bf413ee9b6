// 💾 Persistence Adapter - Namespaced key-value storage
//
// Every state slice is stored as an independent JSON value under
// `money_tracker_<key>`. Reads never fail: a missing or unparsable value
// comes back as None and the caller substitutes its default. Writes that
// fail are logged and otherwise ignored, so the in-memory state stays
// authoritative for the session.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Namespace prepended to every key
pub const PREFIX: &str = "money_tracker_";

/// Storage keys, one per state slice
pub mod keys {
    pub const EXPENSES: &str = "expenses";
    pub const CATEGORIES: &str = "categories";
    pub const CATEGORY_LIMITS: &str = "categoryLimits";
    pub const ROUTINES: &str = "routines";
    pub const BANK_BALANCE: &str = "bankBalance";
    pub const DARK_MODE: &str = "darkMode";
    pub const LAST_ACTIVITY: &str = "last_activity";
}

// ============================================================================
// BACKEND TRAIT
// ============================================================================

/// Synchronous, string-keyed storage medium
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

// ============================================================================
// SQLITE BACKEND
// ============================================================================

/// Key-value table in a local SQLite file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data directory {:?}", parent))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open storage file {:?}", path))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory storage")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        setup_storage(&conn)?;
        Ok(SqliteStore { conn })
    }
}

pub fn setup_storage(conn: &Connection) -> Result<()> {
    // WAL keeps the file consistent if the process dies mid-write
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// Volatile backend for tests and throwaway sessions
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ============================================================================
// TYPED STORAGE
// ============================================================================

/// Typed, namespaced access on top of a `KeyValueStore`
pub struct Storage {
    backend: Box<dyn KeyValueStore>,
}

impl Storage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Storage {
            backend: Box::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn namespaced(key: &str) -> String {
        format!("{}{}", PREFIX, key)
    }

    /// Read and parse `key`. Missing, unreadable or malformed values are None.
    pub fn get_item<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(&Self::namespaced(key)) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, using default");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt value in storage, using default");
                None
            }
        }
    }

    /// Read `key`, falling back to `T::default()`
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get_item(key).unwrap_or_default()
    }

    /// Serialize and write `key`. Failures are logged, never returned.
    pub fn set_item<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(key, error = %e, "failed to serialize value for storage");
                return;
            }
        };

        if let Err(e) = self.backend.set(&Self::namespaced(key), &raw) {
            tracing::error!(key, error = %e, "storage write failed");
        }
    }

    pub fn remove_item(&mut self, key: &str) {
        if let Err(e) = self.backend.remove(&Self::namespaced(key)) {
            tracing::error!(key, error = %e, "storage remove failed");
        }
    }

    /// Raw access for tests and tooling that need to seed exact bytes
    pub fn backend_mut(&mut self) -> &mut dyn KeyValueStore {
        self.backend.as_mut()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Backend whose writes always fail
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("quota exceeded"))
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(anyhow!("quota exceeded"))
        }
    }

    #[test]
    fn test_sqlite_store_roundtrip_and_upsert() {
        let mut store = SqliteStore::open_in_memory().unwrap();

        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap(), Some("2".to_string()));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }

    #[test]
    fn test_sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tracker.db");

        {
            let mut storage = Storage::new(SqliteStore::open(&path).unwrap());
            storage.set_item(keys::BANK_BALANCE, &1500.5);
        }

        let storage = Storage::new(SqliteStore::open(&path).unwrap());
        assert_eq!(storage.get_item::<f64>(keys::BANK_BALANCE), Some(1500.5));
    }

    #[test]
    fn test_keys_are_namespaced() {
        let mut storage = Storage::in_memory();
        storage.set_item(keys::DARK_MODE, &true);

        let raw = storage.backend_mut().get("money_tracker_darkMode").unwrap();
        assert_eq!(raw, Some("true".to_string()));
    }

    #[test]
    fn test_corrupt_value_falls_back_to_default() {
        let mut storage = Storage::in_memory();
        storage
            .backend_mut()
            .set("money_tracker_expenses", "{not json")
            .unwrap();

        assert_eq!(storage.get_item::<Vec<String>>(keys::EXPENSES), None);
        assert!(storage.get_or_default::<Vec<String>>(keys::EXPENSES).is_empty());
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let mut storage = Storage::in_memory();
        storage.set_item(keys::BANK_BALANCE, "lots");

        assert_eq!(storage.get_or_default::<f64>(keys::BANK_BALANCE), 0.0);
    }

    #[test]
    fn test_write_failures_are_swallowed() {
        let mut storage = Storage::new(ReadOnlyStore);

        storage.set_item(keys::ROUTINES, &vec!["Coffee"]);
        storage.remove_item(keys::ROUTINES);

        assert_eq!(storage.get_item::<Vec<String>>(keys::ROUTINES), None);
    }
}
