//! Monitored group registry.
//!
//! Same persistence shape as the category registry: one JSON file, fully
//! rewritten on every mutation, best-effort load.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A chat group whose messages are fed into the category pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredGroup {
    /// Display name, case-preserved; the lookup key is its lowercase form.
    pub name: String,
    /// Transport id, filled in once the transport resolves the group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jid: Option<String>,
    pub added_at: DateTime<Utc>,
}

pub struct GroupManager {
    path: PathBuf,
    groups: RwLock<Vec<MonitoredGroup>>,
}

impl GroupManager {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            groups: RwLock::new(Vec::new()),
        }
    }

    pub async fn load(&self) {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[GROUPS] No monitored group file at {}", self.path.display());
                return;
            }
            Err(e) => {
                log::error!("[GROUPS] Failed to read {}: {}", self.path.display(), e);
                self.groups.write().clear();
                return;
            }
        };

        match serde_json::from_str::<Vec<MonitoredGroup>>(&data) {
            Ok(loaded) => {
                let mut groups = self.groups.write();
                log::debug!("[GROUPS] Loaded {} monitored groups", loaded.len());
                *groups = loaded;
            }
            Err(e) => {
                log::error!("[GROUPS] Corrupt group file, starting empty: {}", e);
                self.groups.write().clear();
            }
        }
    }

    /// Start monitoring a group. Returns `false` when already monitored.
    pub async fn add(&self, name: &str, jid: Option<String>) -> bool {
        let group = MonitoredGroup {
            name: name.to_string(),
            jid,
            added_at: Utc::now(),
        };

        {
            let mut groups = self.groups.write();
            let key = name.to_lowercase();
            if groups.iter().any(|g| g.name.to_lowercase() == key) {
                return false;
            }
            groups.push(group);
        }

        self.save().await;
        log::info!("[GROUPS] Now monitoring {:?}", name);
        true
    }

    /// Stop monitoring a group. Returns `false` when absent.
    pub async fn remove(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        let removed = {
            let mut groups = self.groups.write();
            let before = groups.len();
            groups.retain(|g| g.name.to_lowercase() != key);
            groups.len() != before
        };

        if removed {
            self.save().await;
            log::info!("[GROUPS] Stopped monitoring {:?}", name);
        }
        removed
    }

    pub fn is_monitored(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        self.groups.read().iter().any(|g| g.name.to_lowercase() == key)
    }

    pub fn get(&self, name: &str) -> Option<MonitoredGroup> {
        let key = name.to_lowercase();
        self.groups
            .read()
            .iter()
            .find(|g| g.name.to_lowercase() == key)
            .cloned()
    }

    /// Record the transport id once the group has been resolved.
    pub async fn update_jid(&self, name: &str, jid: &str) {
        let key = name.to_lowercase();
        let updated = {
            let mut groups = self.groups.write();
            match groups.iter_mut().find(|g| g.name.to_lowercase() == key) {
                Some(group) => {
                    group.jid = Some(jid.to_string());
                    true
                }
                None => false,
            }
        };
        if updated {
            self.save().await;
        }
    }

    pub fn list(&self) -> Vec<MonitoredGroup> {
        self.groups.read().clone()
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }

    async fn save(&self) {
        let json = match serde_json::to_string_pretty(&*self.groups.read()) {
            Ok(json) => json,
            Err(e) => {
                log::error!("[GROUPS] Failed to serialize groups: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::error!("[GROUPS] Failed to create {}: {}", parent.display(), e);
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            log::error!("[GROUPS] Failed to write {}: {}", self.path.display(), e);
        }
    }
}
