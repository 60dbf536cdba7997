use std::sync::Arc;

use crate::storage::SessionStorage;

/// Best-effort local wishlist cache, keyed by user id. Holds a deduplicated
/// list of agent ids; load failures degrade to an empty list and save
/// failures are logged and swallowed. No server round-trips.
pub struct Wishlist {
    storage: Arc<dyn SessionStorage>,
    user_id: String,
}

impl Wishlist {
    pub fn new(storage: Arc<dyn SessionStorage>, user_id: impl Into<String>) -> Self {
        Self {
            storage,
            user_id: user_id.into(),
        }
    }

    fn key(&self) -> String {
        format!("wishlist_{}", self.user_id)
    }

    pub fn agent_ids(&self) -> Vec<String> {
        let Some(raw) = self.storage.get(&self.key()) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_default()
    }

    pub fn contains(&self, agent_id: &str) -> bool {
        self.agent_ids().iter().any(|id| id == agent_id)
    }

    /// Adds the id if not already present.
    pub fn add(&self, agent_id: &str) {
        let mut ids = self.agent_ids();
        if ids.iter().any(|id| id == agent_id) {
            return;
        }
        ids.push(agent_id.to_string());
        self.save(&ids);
    }

    pub fn remove(&self, agent_id: &str) {
        let mut ids = self.agent_ids();
        ids.retain(|id| id != agent_id);
        self.save(&ids);
    }

    fn save(&self, ids: &[String]) {
        let raw = match serde_json::to_string(ids) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Failed to serialize wishlist: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.key(), &raw) {
            log::warn!("Failed to save wishlist (ignored): {}", e);
        }
    }
}
