//! Local filesystem storage backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Storage, StorageError};

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }

    fn io_error(path: &Path, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn initialize(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| Self::io_error(&self.base_path, e))
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.full_path(path);
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| Self::io_error(&full, e))
    }

    async fn read_file(&self, path: &str) -> Result<Option<String>, StorageError> {
        let full = self.full_path(path);
        match tokio::fs::read_to_string(&full).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&full, e)),
        }
    }

    async fn save_file(&self, path: &str, content: &str) -> Result<(), StorageError> {
        let full = self.full_path(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(parent, e))?;
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| Self::io_error(&full, e))
    }

    async fn delete_file(&self, path: &str) -> Result<(), StorageError> {
        let full = self.full_path(path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(&full, e)),
        }
    }

    async fn list_files(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let full = self.full_path(dir);
        let mut entries = match tokio::fs::read_dir(&full).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(&full, e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error(&full, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Self::io_error(&entry.path(), e))?;
            if file_type.is_file() {
                files.push(format!(
                    "{}/{}",
                    dir.trim_end_matches('/'),
                    entry.file_name().to_string_lossy()
                ));
            }
        }
        Ok(files)
    }
}
