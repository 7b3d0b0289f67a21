//! Storage abstraction over the markdown vault.
//!
//! The backend is write-mostly: this process pushes documents out and never
//! reconciles remote edits. Paths are relative to the vault root. Remote
//! backends (cloud drive, git sync) are external plugins implementing the
//! same trait; only the local filesystem backend is compiled in.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;

pub mod local;
#[cfg(test)]
pub mod memory;

pub use local::LocalStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unknown storage backend {0:?}")]
    UnknownBackend(String),
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Prepare the backend (create the vault root, open connections).
    async fn initialize(&self) -> Result<(), StorageError>;

    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Read a file. `Ok(None)` means the file does not exist; `Err` is a
    /// genuine read failure — callers must not treat the two alike.
    async fn read_file(&self, path: &str) -> Result<Option<String>, StorageError>;

    /// Create or overwrite a file, creating parent directories as needed.
    async fn save_file(&self, path: &str, content: &str) -> Result<(), StorageError>;

    /// Delete a file. Deleting a missing file is not an error.
    async fn delete_file(&self, path: &str) -> Result<(), StorageError>;

    /// Relative paths of the files directly inside `dir`.
    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError>;
}

/// Build the storage backend selected by the configuration.
pub fn create_storage(config: &Config) -> Result<Arc<dyn Storage>, StorageError> {
    match config.storage_type.as_str() {
        "local" => Ok(Arc::new(LocalStorage::new(config.vault_path.clone()))),
        other => Err(StorageError::UnknownBackend(other.to_string())),
    }
}
