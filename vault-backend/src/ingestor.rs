//! Chat transport boundary.
//!
//! The real transport (QR pairing, reconnect handling) lives in external
//! plugins; this backend only consumes the resulting `Message` stream and
//! drives the trait below. Messages are delivered through a tokio mpsc
//! channel handed to the transport at construction time.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::categories::CategoryWriter;
use crate::config::Config;
use crate::groups::GroupManager;

/// An inbound chat message as the transport delivers it.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub group: String,
    pub sender: String,
    /// `"HH:MM:SS - DD/MM/YYYY"`.
    pub time: String,
    pub content: String,
}

/// A chat group visible to the transport.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[async_trait]
pub trait Ingestor: Send + Sync {
    async fn initialize(&self) -> Result<(), String>;

    /// Open the transport connection.
    async fn start(&self) -> Result<(), String>;

    /// Close the transport connection.
    async fn stop(&self) -> Result<(), String>;

    fn connection_state(&self) -> ConnectionState;

    fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Groups currently visible on the transport side.
    async fn list_groups(&self) -> Result<Vec<Group>, String>;
}

/// Placeholder transport for builds without a chat plugin: never connects
/// and produces no messages, but keeps the dashboard API functional.
pub struct IdleIngestor;

#[async_trait]
impl Ingestor for IdleIngestor {
    async fn initialize(&self) -> Result<(), String> {
        Ok(())
    }

    async fn start(&self) -> Result<(), String> {
        Err("no chat transport is configured (INGESTOR_TYPE=none)".to_string())
    }

    async fn stop(&self) -> Result<(), String> {
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        ConnectionState::Disconnected
    }

    async fn list_groups(&self) -> Result<Vec<Group>, String> {
        Ok(Vec::new())
    }
}

/// Build the ingestor selected by the configuration. `tx` is the sink a
/// real transport pushes inbound messages into.
pub fn create_ingestor(
    config: &Config,
    _tx: mpsc::UnboundedSender<Message>,
) -> Result<Arc<dyn Ingestor>, String> {
    match config.ingestor_type.as_str() {
        "none" => Ok(Arc::new(IdleIngestor)),
        other => Err(format!(
            "unknown ingestor type {other:?} (transport plugins are not compiled into this build)"
        )),
    }
}

/// Spawn the task that drains inbound messages into the category writer.
/// Messages from groups that are not monitored are dropped.
pub fn spawn_ingest_loop(
    mut rx: mpsc::UnboundedReceiver<Message>,
    writer: Arc<CategoryWriter>,
    groups: Arc<GroupManager>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if !groups.is_monitored(&message.group) {
                log::debug!(
                    "[INGEST] Dropping message from unmonitored group {:?}",
                    message.group
                );
                continue;
            }
            writer.process_message(&message).await;
        }
        log::info!("[INGEST] Message stream closed, ingest loop exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::CategoryRegistry;
    use crate::storage::Storage;
    use crate::storage::memory::MemoryStorage;

    #[tokio::test]
    async fn ingest_loop_drops_unmonitored_groups() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(CategoryRegistry::new(dir.path().join("categories.json")));
        registry.add("CODE", None, None, None).await;

        let storage = Arc::new(MemoryStorage::new());
        let dyn_storage: Arc<dyn Storage> = storage.clone();
        let writer = Arc::new(CategoryWriter::new(registry, dyn_storage));

        let groups = Arc::new(GroupManager::new(dir.path().join("groups.json")));
        groups.add("Equipo", None).await;

        let (tx, rx) = mpsc::unbounded_channel();
        let handle = spawn_ingest_loop(rx, writer, groups);

        let message = |group: &str| Message {
            group: group.to_string(),
            sender: "Ana".to_string(),
            time: "10:00:00 - 01/01/2024".to_string(),
            content: ",,CODE hola".to_string(),
        };
        tx.send(message("Otro Grupo")).unwrap();
        tx.send(message("equipo")).unwrap();
        drop(tx);
        handle.await.unwrap();

        // Only the monitored group's message landed.
        assert_eq!(storage.file_count(), 1);
        let doc = storage.get("categories/code.md").unwrap();
        assert!(doc.contains("hola"));
        assert_eq!(doc.matches("## Mensaje #").count(), 1);
    }

    #[tokio::test]
    async fn idle_ingestor_reports_disconnected() {
        let ingestor = IdleIngestor;
        assert_eq!(ingestor.connection_state(), ConnectionState::Disconnected);
        assert!(!ingestor.is_connected());
        assert!(ingestor.start().await.is_err());
        assert!(ingestor.list_groups().await.unwrap().is_empty());
    }
}
