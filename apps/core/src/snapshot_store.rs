use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::tab_store::{decode_windows, encode_windows, TabCollection, WindowSnapshot, WindowsCollection};

pub const WINDOWS_KEY: &str = "windows";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Key-value namespace shared between the host and extension processes.
pub trait SharedDefaults: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryDefaults {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryDefaults {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SharedDefaults for MemoryDefaults {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// SQLite-backed namespace; both processes can open the same file.
pub struct SqliteDefaults {
    conn: Mutex<Connection>,
}

impl SqliteDefaults {
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn open_file(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS shared_defaults (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl SharedDefaults for SqliteDefaults {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM shared_defaults WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO shared_defaults (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

/// The persisted windows snapshot.
///
/// Every mutation is a whole-collection read-modify-write performed while
/// holding `write_lock`, so concurrent writers in this process serialize.
pub struct WindowStore {
    defaults: Box<dyn SharedDefaults>,
    write_lock: Mutex<()>,
}

impl WindowStore {
    pub fn new(defaults: Box<dyn SharedDefaults>) -> Self {
        Self {
            defaults,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryDefaults::new()))
    }

    pub fn load(&self) -> WindowsCollection {
        match self.defaults.get(WINDOWS_KEY) {
            Ok(Some(payload)) => decode_windows(&payload),
            Ok(None) => WindowsCollection::new(),
            Err(error) => {
                tracing::warn!(%error, "failed to read windows snapshot");
                WindowsCollection::new()
            }
        }
    }

    pub fn update<R>(
        &self,
        mutate: impl FnOnce(&mut WindowsCollection) -> R,
    ) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut windows = self.load();
        let result = mutate(&mut windows);
        self.defaults.set(WINDOWS_KEY, &encode_windows(&windows)?)?;
        Ok(result)
    }

    /// Records the current tab list of a window and returns its identity.
    pub fn record_window(&self, tabs: TabCollection) -> Result<String, StoreError> {
        let snapshot = WindowSnapshot::capture(tabs);
        let id = snapshot.combined_id.clone();
        self.update(|windows| windows.push(snapshot))?;
        Ok(id)
    }

    /// Records a new tab list for the window previously stored as
    /// `previous` and returns the window's new identity.
    pub fn replace_window(&self, previous: Option<&str>, tabs: TabCollection) -> Result<String, StoreError> {
        let snapshot = WindowSnapshot::capture(tabs);
        let id = snapshot.combined_id.clone();
        self.update(|windows| windows.replace(previous, snapshot))?;
        Ok(id)
    }

    pub fn prune_to_live(&self, live_ids: &[String]) -> Result<usize, StoreError> {
        self.update(|windows| {
            windows.prune_to_live(live_ids);
            windows.len()
        })
    }
}
