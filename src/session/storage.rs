//! Key-value persistence for the session record. Both backends use the same
//! keys; the durable one survives process restarts, the ephemeral one lives
//! only as long as the process.

use serde_json::{Map, Value};
use std::{
    collections::HashMap,
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error;
use tracing::{debug, warn};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value store.
pub trait KeyValueStore: fmt::Debug + Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Returns a `StorageError` if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str);
}

/// Ephemeral backend held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Durable backend: a JSON object file rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Store backed by `session.json` inside `dir`. Nothing is created until
    /// the first write.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::at(dir.join(SESSION_FILE))
    }

    #[must_use]
    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unreadable or malformed files read as empty.
    fn read_map(&self) -> Map<String, Value> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                debug!(path = %self.path.display(), "ignoring malformed session file");
                Map::new()
            }
        }
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let encoded = serde_json::to_vec_pretty(map)?;
        let temp_path = self.path.with_extension("tmp");

        // Owner-only: the file holds the bearer token.
        {
            let mut opts = fs::OpenOptions::new();
            opts.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                opts.mode(0o600);
            }
            let mut file = opts.open(&temp_path)?;
            file.write_all(&encoded)?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_map()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map();
        map.insert(key.to_string(), Value::String(value.to_string()));
        self.write_map(&map)
    }

    fn remove(&self, key: &str) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map();
        if map.remove(key).is_none() {
            return;
        }
        if let Err(err) = self.write_map(&map) {
            warn!(path = %self.path.display(), "failed to update session file: {err}");
        }
    }
}

/// The two session backends.
#[derive(Clone, Debug)]
pub struct Backends {
    pub durable: Arc<dyn KeyValueStore>,
    pub ephemeral: Arc<dyn KeyValueStore>,
}

impl Backends {
    #[must_use]
    pub fn new(durable: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, ephemeral }
    }

    /// File-backed durable store in `dir` with an in-memory ephemeral store.
    #[must_use]
    pub fn on_disk(dir: &Path) -> Self {
        Self::new(Arc::new(FileStore::in_dir(dir)), Arc::new(MemoryStore::new()))
    }

    /// Both backends in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Write target for a login.
    #[must_use]
    pub fn for_remember_me(&self, remember_me: bool) -> &Arc<dyn KeyValueStore> {
        if remember_me {
            &self.durable
        } else {
            &self.ephemeral
        }
    }

    /// Durable first, then ephemeral.
    pub(crate) fn read_order(&self) -> [(&'static str, &Arc<dyn KeyValueStore>); 2] {
        [("durable", &self.durable), ("ephemeral", &self.ephemeral)]
    }
}
