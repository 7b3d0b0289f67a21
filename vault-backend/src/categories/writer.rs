//! Categorized message persistence.
//!
//! `CategoryWriter` turns matched inbound messages into markdown document
//! updates: detect, load, decode, merge, re-encode, write back. Writes for
//! the same category serialize on a per-key lane so concurrent deliveries
//! cannot lose updates; different categories proceed in parallel.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Semaphore;

use crate::ingestor::Message;
use crate::storage::{Storage, StorageError};

use super::codec;
use super::detector;
use super::registry::CategoryRegistry;
use super::types::{CategorizedMessage, CategoryDefinition};

pub struct CategoryWriter {
    registry: Arc<CategoryRegistry>,
    storage: Arc<dyn Storage>,
    /// One permit per category key; holds writes for the same document
    /// back-to-back.
    lanes: DashMap<String, Arc<Semaphore>>,
}

impl CategoryWriter {
    pub fn new(registry: Arc<CategoryRegistry>, storage: Arc<dyn Storage>) -> Self {
        Self {
            registry,
            storage,
            lanes: DashMap::new(),
        }
    }

    /// Archive a message if it carries a category tag.
    ///
    /// `false` covers both the common case (no tag — most traffic) and any
    /// failure along the way; failures are logged, never propagated.
    pub async fn process_message(&self, message: &Message) -> bool {
        let Some(detected) = detector::detect(&message.content, &self.registry.list()) else {
            return false;
        };

        let Some(category) = self.registry.get(&detected.category_name) else {
            log::warn!(
                "[WRITER] Category {:?} matched but is no longer registered",
                detected.category_name
            );
            return false;
        };

        // Inbound time format: "HH:MM:SS - DD/MM/YYYY".
        let (time, date) = match message.time.split_once(" - ") {
            Some((time, date)) => (time.to_string(), date.to_string()),
            None => (message.time.clone(), String::new()),
        };
        let timestamp = codec::parse_timestamp(&time, &date).unwrap_or_else(|| {
            log::warn!(
                "[WRITER] Unparsable message time {:?} from {}, ordering by current time",
                message.time,
                message.sender
            );
            Utc::now().timestamp_millis()
        });

        let entry = CategorizedMessage {
            content: detected.content,
            sender: message.sender.clone(),
            time,
            date,
            timestamp,
        };

        match self.append(&category, entry).await {
            Ok(()) => {
                log::info!(
                    "[WRITER] Archived message from {} into {:?}",
                    message.sender,
                    category.name
                );
                true
            }
            Err(e) => {
                log::error!("[WRITER] Failed to update {:?}: {}", category.name, e);
                false
            }
        }
    }

    /// Remove a category's markdown document. Returns `false` when there is
    /// no document or the delete failed.
    pub async fn delete_document(&self, category: &CategoryDefinition) -> bool {
        let path = category.markdown_path();
        let _permit = self.lane(&category.normalized_key()).acquire_owned().await
            .expect("lane semaphore should not be closed");

        match self.storage.exists(&path).await {
            Ok(true) => match self.storage.delete_file(&path).await {
                Ok(()) => {
                    log::debug!("[WRITER] Deleted document {}", path);
                    true
                }
                Err(e) => {
                    log::error!("[WRITER] Failed to delete {}: {}", path, e);
                    false
                }
            },
            Ok(false) => false,
            Err(e) => {
                log::error!("[WRITER] Failed to stat {}: {}", path, e);
                false
            }
        }
    }

    async fn append(
        &self,
        category: &CategoryDefinition,
        entry: CategorizedMessage,
    ) -> Result<(), StorageError> {
        let path = category.markdown_path();
        let _permit = self.lane(&category.normalized_key()).acquire_owned().await
            .expect("lane semaphore should not be closed");

        let (header, mut messages) = if self.storage.exists(&path).await? {
            // An existing document that cannot be read must abort the write:
            // falling through to a fresh header would clobber it.
            match self.storage.read_file(&path).await? {
                Some(raw) => {
                    let decoded = codec::decode(&raw);
                    for warning in &decoded.warnings {
                        log::warn!("[WRITER] {}: {}", path, warning);
                    }
                    (decoded.header, decoded.messages)
                }
                // Vanished between exists() and read: treat as new.
                None => (codec::generate_header(category), Vec::new()),
            }
        } else {
            (codec::generate_header(category), Vec::new())
        };

        let duplicate = messages.iter().any(|m| {
            m.content == entry.content && m.sender == entry.sender && m.timestamp == entry.timestamp
        });
        if !duplicate {
            messages.push(entry);
        }

        // Newest first; stable, so equal stamps keep their relative order.
        messages.sort_by_key(|m| std::cmp::Reverse(m.timestamp));

        let text = codec::encode(&header, category, &messages);
        self.storage.save_file(&path, &text).await
    }

    fn lane(&self, key: &str) -> Arc<Semaphore> {
        self.lanes
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone()
    }
}
