//! Session-scoped key/value storage for the selection store.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// String blobs under string keys, living as long as the login session.
pub trait SessionStorage: Send + Sync {
  fn get_item(&self, key: &str) -> Result<Option<String>>;

  fn set_item(&self, key: &str, value: &str) -> Result<()>;

  fn remove_item(&self, key: &str) -> Result<()>;

  /// Drop every key.
  fn clear(&self) -> Result<()>;
}

/// Process-local storage; gone when the process exits.
#[derive(Default)]
pub struct MemoryStorage {
  items: Mutex<HashMap<String, String>>,
  writes: AtomicUsize,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of `set_item`/`remove_item`/`clear` calls so far
  pub fn writes(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
    self.items.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

impl SessionStorage for MemoryStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    Ok(self.items()?.get(key).cloned())
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    self.items()?.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    self.items()?.remove(key);
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    self.writes.fetch_add(1, Ordering::SeqCst);
    self.items()?.clear();
    Ok(())
  }
}

/// SQLite-backed session storage.
///
/// The database lives in the per-login runtime directory, which the OS
/// empties at logout, so its contents last exactly one session.
pub struct SqliteSessionStorage {
  conn: Mutex<Connection>,
  path: PathBuf,
}

impl SqliteSessionStorage {
  /// Open the session database for `endpoint` inside `dir`.
  ///
  /// Each endpoint gets its own file so two backends never share a selection.
  pub fn open(dir: &Path, endpoint: &str) -> Result<Self> {
    std::fs::create_dir_all(dir)
      .map_err(|e| eyre!("Failed to create session directory {}: {}", dir.display(), e))?;

    let path = dir.join(Self::file_name(endpoint));
    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open session database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
      path,
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  /// `$XDG_RUNTIME_DIR/jobdesk`, or a directory under the temp dir when the
  /// platform has no runtime directory.
  pub fn default_dir() -> PathBuf {
    dirs::runtime_dir()
      .unwrap_or_else(std::env::temp_dir)
      .join("jobdesk")
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn file_name(endpoint: &str) -> String {
    let digest = Sha256::digest(endpoint.as_bytes());
    format!("session-{}.db", &hex::encode(digest)[..16])
  }

  fn run_migrations(&self) -> Result<()> {
    self
      .lock()?
      .execute_batch(SESSION_SCHEMA)
      .map_err(|e| eyre!("Failed to run session migrations: {}", e))?;
    Ok(())
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self.conn.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }
}

const SESSION_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS session_items (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SessionStorage for SqliteSessionStorage {
  fn get_item(&self, key: &str) -> Result<Option<String>> {
    self
      .lock()?
      .query_row(
        "SELECT value FROM session_items WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(|e| eyre!("Failed to read session item '{}': {}", key, e))
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    self
      .lock()?
      .execute(
        "INSERT OR REPLACE INTO session_items (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, value],
      )
      .map_err(|e| eyre!("Failed to store session item '{}': {}", key, e))?;
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    self
      .lock()?
      .execute("DELETE FROM session_items WHERE key = ?", params![key])
      .map_err(|e| eyre!("Failed to remove session item '{}': {}", key, e))?;
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    self
      .lock()?
      .execute("DELETE FROM session_items", [])
      .map_err(|e| eyre!("Failed to clear session storage: {}", e))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ENDPOINT: &str = "http://127.0.0.1:4000/graphql";

  #[test]
  fn test_sqlite_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteSessionStorage::open(dir.path(), ENDPOINT).unwrap();

    assert_eq!(storage.get_item("jobs-storage").unwrap(), None);
    storage.set_item("jobs-storage", r#"{"vacancy":null}"#).unwrap();
    storage.set_item("jobs-storage", r#"{"vacancy":{"uid":"a"}}"#).unwrap();
    assert_eq!(
      storage.get_item("jobs-storage").unwrap().as_deref(),
      Some(r#"{"vacancy":{"uid":"a"}}"#)
    );

    storage.remove_item("jobs-storage").unwrap();
    assert_eq!(storage.get_item("jobs-storage").unwrap(), None);
  }

  #[test]
  fn test_sqlite_survives_reopen_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    {
      let storage = SqliteSessionStorage::open(dir.path(), ENDPOINT).unwrap();
      storage.set_item("a", "1").unwrap();
      storage.set_item("b", "2").unwrap();
    }

    let storage = SqliteSessionStorage::open(dir.path(), ENDPOINT).unwrap();
    assert_eq!(storage.get_item("b").unwrap().as_deref(), Some("2"));
    storage.clear().unwrap();
    assert_eq!(storage.get_item("a").unwrap(), None);
    assert_eq!(storage.get_item("b").unwrap(), None);
  }

  #[test]
  fn test_endpoints_get_separate_files() {
    let dir = tempfile::tempdir().unwrap();
    let local = SqliteSessionStorage::open(dir.path(), ENDPOINT).unwrap();
    let remote = SqliteSessionStorage::open(dir.path(), "https://jobs.example/graphql").unwrap();
    assert_ne!(local.path(), remote.path());

    local.set_item("k", "local").unwrap();
    assert_eq!(remote.get_item("k").unwrap(), None);
  }

  #[test]
  fn test_memory_storage_counts_writes() {
    let storage = MemoryStorage::new();
    storage.set_item("k", "v").unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    storage.remove_item("k").unwrap();
    assert_eq!(storage.writes(), 2);
  }
}
