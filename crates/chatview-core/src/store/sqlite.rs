//! SQLite-backed key-value store

use super::{run_migrations, KeyValueStore, Listener, Subscribers, Subscription};
use crate::error::{Error, Result, StorageError};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::info;

/// Database connection pool type
pub type DbPool = Pool<SqliteConnectionManager>;

/// Key-value store persisted in a SQLite database
pub struct SqliteStore {
    pool: DbPool,
    db_path: PathBuf,
    subscribers: Subscribers,
}

impl SqliteStore {
    /// Open (or create) the store inside a data directory
    pub fn new_with_path(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();

        std::fs::create_dir_all(data_dir).map_err(|e| {
            Error::Storage(StorageError::Database(format!(
                "Failed to create data directory: {}",
                e
            )))
        })?;

        let db_path = data_dir.join("chatview.db");
        info!("Database path: {:?}", db_path);

        Self::from_path(db_path)
    }

    /// Open a specific database file
    pub fn from_path(db_path: PathBuf) -> Result<Self> {
        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))?;

        let store = Self {
            pool,
            db_path,
            subscribers: Subscribers::default(),
        };
        store.initialize()?;
        Ok(store)
    }

    /// In-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))?;

        let store = Self {
            pool,
            db_path: PathBuf::from(":memory:"),
            subscribers: Subscribers::default(),
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        run_migrations(&conn).map_err(|e| {
            Error::Storage(StorageError::MigrationFailed(e.to_string()))
        })?;
        info!("Database initialized successfully");
        Ok(())
    }

    pub fn connection(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM key_values WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            r#"
            INSERT INTO key_values (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, chrono::Utc::now().to_rfc3339()],
        )?;
        drop(conn);

        self.subscribers.notify(key, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connection()?;
        let removed = conn.execute("DELETE FROM key_values WHERE key = ?", params![key])?;
        drop(conn);

        if removed > 0 {
            self.subscribers.notify(key, None);
        }
        Ok(())
    }

    fn subscribe(&self, listener: Listener) -> Subscription {
        self.subscribers.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::keys;
    use tempfile::tempdir;

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        store.set(keys::THEME, "dark").unwrap();
        assert_eq!(store.get(keys::THEME).unwrap().as_deref(), Some("dark"));

        store.set(keys::THEME, "light").unwrap();
        assert_eq!(store.get(keys::THEME).unwrap().as_deref(), Some("light"));

        assert!(store.get("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = SqliteStore::new_with_path(dir.path()).unwrap();
            store.set(keys::ACCESS_TOKEN, "abc").unwrap();
            store.set(keys::REFRESH_TOKEN, "def").unwrap();
            store.remove(keys::REFRESH_TOKEN).unwrap();
        }

        let store = SqliteStore::new_with_path(dir.path()).unwrap();
        assert_eq!(store.get(keys::ACCESS_TOKEN).unwrap().as_deref(), Some("abc"));
        assert!(store.get(keys::REFRESH_TOKEN).unwrap().is_none());
        assert!(store.db_path().ends_with("chatview.db"));
    }
}
