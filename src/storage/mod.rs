//! Persistent key-value slots
//!
//! The history store and display settings each own one named slot holding an
//! opaque serialized blob. [`SqliteStore`] keeps the slots in the client
//! database; [`MemoryStore`] backs tests and throwaway sessions.

mod database;
mod migrations;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection};

use crate::error::{Error, Result};

pub use database::{Database, DatabaseError};

/// Slot holding the serialized history store
pub const HISTORY_KEY: &str = "history";

/// Slot holding serialized display settings
pub const SETTINGS_KEY: &str = "settings";

/// Named-blob storage the core persists through
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

fn unavailable(e: rusqlite::Error) -> Error {
    Error::PersistenceUnavailable(e.to_string())
}

/// Key-value slots in the `app_state` table
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub fn from_database(db: &Database) -> Self {
        Self::new(db.connection())
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT value FROM app_state WHERE key = ?1")
            .map_err(unavailable)?;
        let mut rows = stmt.query(params![key]).map_err(unavailable)?;

        match rows.next().map_err(unavailable)? {
            Some(row) => Ok(Some(row.get(0).map_err(unavailable)?)),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO app_state (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, Utc::now().to_rfc3339()],
        )
        .map_err(unavailable)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM app_state WHERE key = ?1", params![key])
            .map_err(unavailable)?;
        Ok(())
    }
}

/// In-memory slots.
///
/// Clones share the same slots. [`MemoryStore::set_available`] simulates the
/// backing store going away (quota exceeded, storage disabled).
#[derive(Clone, Default)]
pub struct MemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(Error::PersistenceUnavailable(
                "memory store marked unavailable".into(),
            ))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.check()?;
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check()?;
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.check()?;
        self.slots.lock().remove(key);
        Ok(())
    }
}
