//! In-memory storage backend used by tests.

use async_trait::async_trait;
use dashmap::DashMap;

use super::{Storage, StorageError};

#[derive(Default)]
pub struct MemoryStorage {
    files: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.files.get(path).map(|entry| entry.clone())
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn initialize(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.files.contains_key(path))
    }

    async fn read_file(&self, path: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(path))
    }

    async fn save_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        self.files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        self.files.remove(path);
        Ok(())
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        Ok(self
            .files
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }
}
