use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::User;

/// Fixed key the bearer token is persisted under.
pub const TOKEN_KEY: &str = "auth_token";
/// Fixed key the serialized current-user record is persisted under.
pub const USER_KEY: &str = "current_user";

/// Durable client-side key/value storage for the session (and the wishlist
/// cache). Implementations must tolerate concurrent readers; writes are rare
/// and small.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str);
}

/// Session helpers shared by the API client and the store.
pub trait SessionStorageExt: SessionStorage {
    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
    }

    fn user(&self) -> Option<User> {
        let raw = self.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("Discarding corrupt persisted user record: {}", e);
                None
            }
        }
    }

    fn store_session(&self, token: &str, user: &User) -> AppResult<()> {
        self.set(TOKEN_KEY, token)?;
        self.set(USER_KEY, &serde_json::to_string(user)?)?;
        Ok(())
    }

    /// Erases both session keys. Called on logout and on any 401 response.
    fn clear_session(&self) {
        self.remove(TOKEN_KEY);
        self.remove(USER_KEY);
    }
}

impl<S: SessionStorage + ?Sized> SessionStorageExt for S {}

/// File-backed storage under the platform data directory, one file per key.
/// Missing or unreadable files are treated as absent values.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `<data_dir>/agentmart`.
    pub fn new() -> AppResult<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| AppError::Storage("No platform data directory available".into()))?;
        Self::at(base.join("agentmart"))
    }

    pub fn at(dir: PathBuf) -> AppResult<Self> {
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        std::fs::write(self.path_for(key), value)
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))
    }

    fn remove(&self, key: &str) {
        let _ = std::fs::remove_file(self.path_for(key));
    }
}

/// In-process storage for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MemoryStorage {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}
