//! File-backed queue for local dev and tests — no AWS account required.
//! Each message is one file under `root/`; `poll_batch` claims the oldest
//! files by renaming them into an `in-flight/` subdirectory so a crashed
//! consumer doesn't lose them, `ack` deletes the claimed file, `nack`
//! moves it back.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::consumer::{QueueConsumer, QueueHealth, QueueMessage, QueueProducer};
use crate::error::QueueError;

pub struct LocalQueue {
    root: PathBuf,
    in_flight: PathBuf,
    lock: Mutex<()>,
}

impl LocalQueue {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let root = root.into();
        let in_flight = root.join("in-flight");
        std::fs::create_dir_all(&root).map_err(|e| QueueError::Provider(e.to_string()))?;
        std::fs::create_dir_all(&in_flight).map_err(|e| QueueError::Provider(e.to_string()))?;
        Ok(Self { root, in_flight, lock: Mutex::new(()) })
    }

    fn claimed_path(&self, receipt_handle: &str) -> PathBuf {
        self.in_flight.join(receipt_handle)
    }
}

#[async_trait]
impl QueueConsumer for LocalQueue {
    async fn poll_batch(&self, max_messages: u32) -> Result<Vec<QueueMessage>, QueueError> {
        let _guard = self.lock.lock().unwrap();
        let mut entries: Vec<PathBuf> = std::fs::read_dir(&self.root)
            .map_err(|e| QueueError::Provider(e.to_string()))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        let mut messages = Vec::new();
        for path in entries.into_iter().take(max_messages as usize) {
            let body = std::fs::read_to_string(&path).map_err(|e| QueueError::Provider(e.to_string()))?;
            let receipt_handle = Uuid::new_v4().to_string();
            let claimed = self.claimed_path(&receipt_handle);
            std::fs::rename(&path, &claimed).map_err(|e| QueueError::Provider(e.to_string()))?;
            debug!(path = %claimed.display(), "claimed local queue message");
            messages.push(QueueMessage {
                id: path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
                body,
                receipt_handle,
                timestamp: Utc::now(),
                attempt_count: 1,
            });
        }
        Ok(messages)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let path = self.claimed_path(receipt_handle);
        std::fs::remove_file(&path).ok();
        Ok(())
    }

    async fn nack(&self, receipt_handle: &str) -> Result<(), QueueError> {
        let claimed = self.claimed_path(receipt_handle);
        let restored = self.root.join(format!("requeued-{}", Uuid::new_v4()));
        std::fs::rename(&claimed, &restored).map_err(|e| QueueError::Provider(e.to_string()))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<QueueHealth, QueueError> {
        let count = std::fs::read_dir(&self.root)
            .map_err(|e| QueueError::Provider(e.to_string()))?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .count() as u64;
        Ok(QueueHealth { connected: true, approximate_message_count: Some(count), provider: "local".to_string() })
    }
}

#[async_trait]
impl QueueProducer for LocalQueue {
    async fn send(&self, body: &str) -> Result<(), QueueError> {
        let _guard = self.lock.lock().unwrap();
        let path = self.root.join(format!("{}-{}", Utc::now().timestamp_nanos_opt().unwrap_or(0), Uuid::new_v4()));
        std::fs::write(&path, body).map_err(|e| QueueError::Provider(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_then_poll_roundtrips() {
        let tmp = std::env::temp_dir().join(format!("gazette-queue-test-{}", Uuid::new_v4()));
        let queue = LocalQueue::new(&tmp).unwrap();
        queue.send(r#"{"topic_id":"t1"}"#).await.unwrap();

        let messages = queue.poll_batch(10).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, r#"{"topic_id":"t1"}"#);

        queue.ack(&messages[0].receipt_handle).await.unwrap();
        let again = queue.poll_batch(10).await.unwrap();
        assert!(again.is_empty());
        std::fs::remove_dir_all(&tmp).ok();
    }

    #[tokio::test]
    async fn nack_restores_message_for_redelivery() {
        let tmp = std::env::temp_dir().join(format!("gazette-queue-test-{}", Uuid::new_v4()));
        let queue = LocalQueue::new(&tmp).unwrap();
        queue.send("body").await.unwrap();

        let messages = queue.poll_batch(10).await.unwrap();
        queue.nack(&messages[0].receipt_handle).await.unwrap();

        let redelivered = queue.poll_batch(10).await.unwrap();
        assert_eq!(redelivered.len(), 1);
        std::fs::remove_dir_all(&tmp).ok();
    }
}
