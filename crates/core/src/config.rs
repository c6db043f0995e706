//! Per-user configuration and the process-wide store that holds it.
//!
//! [`ConfigStore`] is created empty at startup. The configuration-save
//! path upserts entries through [`ConfigStore::save`]; a pipeline run
//! only ever reads a snapshot via [`ConfigStore::resolve_active`].
//! Concurrent writes for the same caller are last-writer-wins.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CoreError;

/// Settings stored for a single caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfiguration {
    /// Capability identifiers this caller may invoke, in insertion order
    /// and without duplicates.
    #[serde(default)]
    pub app_ids: Vec<String>,
}

impl UserConfiguration {
    /// Build a configuration, dropping repeated identifiers while keeping
    /// first-seen order.
    pub fn new<I, S>(app_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        for id in app_ids {
            let id = id.into();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self { app_ids: ids }
    }

    /// Whether `capability_id` is on this caller's allowlist.
    pub fn permits(&self, capability_id: &str) -> bool {
        self.app_ids.iter().any(|id| id == capability_id)
    }

    pub fn is_empty(&self) -> bool {
        self.app_ids.is_empty()
    }
}

/// Process-wide map of caller identity to [`UserConfiguration`].
#[derive(Debug, Default)]
pub struct ConfigStore {
    entries: RwLock<HashMap<String, Arc<UserConfiguration>>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert every configuration in `configurations`.
    pub async fn save(&self, configurations: HashMap<String, UserConfiguration>) {
        let mut entries = self.entries.write().await;
        for (caller_id, conf) in configurations {
            tracing::info!(caller = %caller_id, "Saving new config for user");
            let normalized = UserConfiguration::new(conf.app_ids);
            entries.insert(caller_id, Arc::new(normalized));
        }
    }

    /// Look up the stored configuration for `caller_id`, if any.
    pub async fn get(&self, caller_id: &str) -> Option<Arc<UserConfiguration>> {
        self.entries.read().await.get(caller_id).cloned()
    }

    /// Resolve the configuration a run should use.
    ///
    /// A caller with nothing stored gets an empty allowlist rather than
    /// an error.
    pub async fn resolve_active(&self, caller_id: &str) -> Arc<UserConfiguration> {
        match self.get(caller_id).await {
            Some(conf) => conf,
            None => {
                tracing::debug!(caller = %caller_id, "No stored config, using empty allowlist");
                Arc::new(UserConfiguration::default())
            }
        }
    }

    /// Number of callers with a stored configuration.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Read a JSON file of `{"<caller>": {"app_ids": [...]}}` and save
    /// its entries. Returns how many callers were loaded.
    pub async fn load_file(&self, path: &Path) -> Result<usize, CoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let configurations: HashMap<String, UserConfiguration> = serde_json::from_str(&raw)
            .map_err(|e| {
                CoreError::Configuration(format!(
                    "Invalid user configuration file '{}': {e}",
                    path.display()
                ))
            })?;
        let count = configurations.len();
        self.save(configurations).await;
        Ok(count)
    }
}
