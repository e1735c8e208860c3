//! Key-value storage trait and its SQLite and in-memory implementations.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Trait for persistent key-value backends.
///
/// Values are opaque strings; the cache layer owns their encoding.
pub trait KeyValueStore: Send + Sync + 'static {
  /// Read the value stored under `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Store or overwrite the value under `key`.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Remove `key`. Removing a missing key is not an error.
  fn remove(&self, key: &str) -> Result<()>;

  /// Remove every key.
  fn clear(&self) -> Result<()>;
}

/// Storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
    self
      .entries
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  /// Number of stored keys.
  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries.lock().map(|e| e.len()).unwrap_or_default()
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    self.lock()?.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    self.lock()?.remove(key);
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    self.lock()?.clear();
    Ok(())
  }
}

/// SQLite-based key-value storage.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

impl SqliteStore {
  /// Open (or create) the store at `path`.
  pub fn open(path: &Path) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create storage directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open store at {}: {}", path.display(), e))?;

    let store = Self {
      conn: Mutex::new(conn),
    };
    store.run_migrations()?;

    Ok(store)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("shopcache").join("store.db"))
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(STORE_SCHEMA)
      .map_err(|e| eyre!("Failed to run storage migrations: {}", e))?;

    Ok(())
  }
}

const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl KeyValueStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read key {}: {}", key, e))
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, value, written_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to write key {}: {}", key, e))?;

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM kv_store WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove key {}: {}", key, e))?;

    Ok(())
  }

  fn clear(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute("DELETE FROM kv_store", [])
      .map_err(|e| eyre!("Failed to clear store: {}", e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn exercise(store: &dyn KeyValueStore) {
    assert_eq!(store.get("authToken").unwrap(), None);

    store.set("authToken", "abc").unwrap();
    store.set("authToken", "def").unwrap();
    store.set("page_1", "[]").unwrap();
    assert_eq!(store.get("authToken").unwrap().as_deref(), Some("def"));

    store.remove("authToken").unwrap();
    store.remove("authToken").unwrap();
    assert_eq!(store.get("authToken").unwrap(), None);
    assert_eq!(store.get("page_1").unwrap().as_deref(), Some("[]"));

    store.clear().unwrap();
    assert_eq!(store.get("page_1").unwrap(), None);
  }

  #[test]
  fn test_memory_store() {
    exercise(&MemoryStore::new());
  }

  #[test]
  fn test_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(&dir.path().join("nested").join("store.db")).unwrap();
    exercise(&store);
  }

  #[test]
  fn test_sqlite_store_persists_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    SqliteStore::open(&path)
      .unwrap()
      .set("username", "mor_2314")
      .unwrap();

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(
      reopened.get("username").unwrap().as_deref(),
      Some("mor_2314")
    );
  }
}
