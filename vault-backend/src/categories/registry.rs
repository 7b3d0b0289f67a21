//! Category registry backed by a JSON file.
//!
//! The whole registry is rewritten on every mutation; there are no partial
//! updates. Loading is best-effort: a corrupt file resets the registry to
//! empty and logs, it never surfaces an error to the caller.

use std::path::PathBuf;

use chrono::Utc;
use parking_lot::RwLock;
use serde::Deserialize;

use super::types::{CategoryDefinition, DEFAULT_SEPARATOR, FieldSet};

/// Partial update applied by [`CategoryRegistry::update`]. Absent fields
/// keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub description: Option<String>,
    pub enabled_fields: Option<FieldSet>,
    pub separator: Option<String>,
}

/// In-memory category store with JSON persistence, insertion-ordered.
pub struct CategoryRegistry {
    path: PathBuf,
    categories: RwLock<Vec<CategoryDefinition>>,
}

impl CategoryRegistry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            categories: RwLock::new(Vec::new()),
        }
    }

    /// Load the registry file. Missing file → empty registry; unreadable or
    /// corrupt file → empty registry plus an error log.
    pub async fn load(&self) {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[REGISTRY] No category file at {}", self.path.display());
                return;
            }
            Err(e) => {
                log::error!("[REGISTRY] Failed to read {}: {}", self.path.display(), e);
                self.categories.write().clear();
                return;
            }
        };

        match serde_json::from_str::<Vec<CategoryDefinition>>(&data) {
            Ok(loaded) => {
                let mut categories = self.categories.write();
                log::debug!("[REGISTRY] Loaded {} categories", loaded.len());
                *categories = loaded;
            }
            Err(e) => {
                log::error!("[REGISTRY] Corrupt category file, starting empty: {}", e);
                self.categories.write().clear();
            }
        }
    }

    /// Register a new category. Returns `false` when a category with the
    /// same normalized name already exists.
    pub async fn add(
        &self,
        name: &str,
        description: Option<String>,
        fields: Option<FieldSet>,
        separator: Option<String>,
    ) -> bool {
        let definition = CategoryDefinition {
            name: name.to_string(),
            description,
            enabled_fields: fields.unwrap_or_default(),
            separator: sanitize_separator(separator),
            created_at: Utc::now(),
        };

        {
            let mut categories = self.categories.write();
            let key = definition.normalized_key();
            if categories.iter().any(|c| c.normalized_key() == key) {
                return false;
            }
            categories.push(definition);
        }

        self.save().await;
        true
    }

    /// Remove a category by name. Returns `false` when absent.
    pub async fn remove(&self, name: &str) -> bool {
        let key = name.to_lowercase();
        let removed = {
            let mut categories = self.categories.write();
            let before = categories.len();
            categories.retain(|c| c.normalized_key() != key);
            categories.len() != before
        };

        if removed {
            self.save().await;
        }
        removed
    }

    /// Merge a partial update into an existing category. Returns `false`
    /// when absent.
    pub async fn update(&self, name: &str, update: CategoryUpdate) -> bool {
        let key = name.to_lowercase();
        let updated = {
            let mut categories = self.categories.write();
            match categories.iter_mut().find(|c| c.normalized_key() == key) {
                Some(category) => {
                    if update.description.is_some() {
                        category.description = update.description;
                    }
                    if let Some(fields) = update.enabled_fields {
                        category.enabled_fields = fields;
                    }
                    if let Some(separator) = update.separator {
                        category.separator = sanitize_separator(Some(separator));
                    }
                    true
                }
                None => false,
            }
        };

        if updated {
            self.save().await;
        }
        updated
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<CategoryDefinition> {
        let key = name.to_lowercase();
        self.categories
            .read()
            .iter()
            .find(|c| c.normalized_key() == key)
            .cloned()
    }

    /// All categories in registration order.
    pub fn list(&self) -> Vec<CategoryDefinition> {
        self.categories.read().clone()
    }

    pub fn len(&self) -> usize {
        self.categories.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.read().is_empty()
    }

    async fn save(&self) {
        let json = match serde_json::to_string_pretty(&*self.categories.read()) {
            Ok(json) => json,
            Err(e) => {
                log::error!("[REGISTRY] Failed to serialize categories: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::error!("[REGISTRY] Failed to create {}: {}", parent.display(), e);
                return;
            }
        }
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            log::error!("[REGISTRY] Failed to write {}: {}", self.path.display(), e);
        }
    }
}

/// Separators are 1–3 characters; anything else silently becomes the
/// default.
fn sanitize_separator(separator: Option<String>) -> String {
    match separator {
        Some(s) if (1..=3).contains(&s.chars().count()) => s,
        Some(s) => {
            log::warn!(
                "[REGISTRY] Invalid separator {:?}, using {:?}",
                s,
                DEFAULT_SEPARATOR
            );
            DEFAULT_SEPARATOR.to_string()
        }
        None => DEFAULT_SEPARATOR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(dir: &tempfile::TempDir) -> CategoryRegistry {
        CategoryRegistry::new(dir.path().join("categories.json"))
    }

    #[tokio::test]
    async fn add_rejects_case_insensitive_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir);

        assert!(registry.add("Code", None, None, None).await);
        assert!(!registry.add("code", None, None, None).await);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn invalid_separator_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir);

        registry
            .add("Code", None, None, Some("####".to_string()))
            .await;
        assert_eq!(registry.get("code").unwrap().separator, DEFAULT_SEPARATOR);

        registry
            .add("Notas", None, None, Some("!".to_string()))
            .await;
        assert_eq!(registry.get("notas").unwrap().separator, "!");
    }

    #[tokio::test]
    async fn remove_missing_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir);

        assert!(!registry.remove("ghost").await);
        assert!(registry.add("Code", None, None, None).await);
        assert!(registry.remove("CODE").await);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn update_merges_partial_changes() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(&dir);
        registry
            .add("Code", Some("antes".to_string()), None, None)
            .await;

        let ok = registry
            .update(
                "code",
                CategoryUpdate {
                    description: Some("después".to_string()),
                    separator: Some("!!".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(ok);

        let category = registry.get("Code").unwrap();
        assert_eq!(category.description.as_deref(), Some("después"));
        assert_eq!(category.separator, "!!");
        // Untouched fields keep their values.
        assert!(category.enabled_fields.date);

        assert!(!registry.update("ghost", CategoryUpdate::default()).await);
    }

    #[tokio::test]
    async fn persists_and_reloads_in_registration_order() {
        let dir = tempfile::tempdir().unwrap();
        {
            let registry = registry(&dir);
            registry.add("Beta", None, None, None).await;
            registry.add("Alfa", None, None, None).await;
        }

        let reloaded = registry(&dir);
        reloaded.load().await;

        let names: Vec<String> = reloaded.list().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Beta".to_string(), "Alfa".to_string()]);
    }

    #[tokio::test]
    async fn corrupt_file_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("categories.json");
        std::fs::write(&path, "esto no es json").unwrap();

        let registry = CategoryRegistry::new(path);
        registry.load().await;

        assert!(registry.is_empty());
        // The registry stays usable afterwards.
        assert!(registry.add("Code", None, None, None).await);
    }
}
