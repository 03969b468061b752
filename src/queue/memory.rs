//! Process-local queue with visibility timeouts and long-poll receive.

use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use super::{MessageQueue, QueueError, QueueMessage, ReceiveOptions};

struct Entry {
    message: QueueMessage,
    visible_at: Instant,
}

pub struct InMemoryQueue {
    name: String,
    entries: Mutex<Vec<Entry>>,
    arrived: Notify,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(Vec::new()),
            arrived: Notify::new(),
        }
    }

    /// Bodies of every message still on the queue, in arrival order
    pub async fn bodies(&self) -> Vec<String> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|e| e.message.body.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn take_visible(entries: &mut [Entry], options: &ReceiveOptions) -> Vec<QueueMessage> {
        let now = Instant::now();
        entries
            .iter_mut()
            .filter(|e| e.visible_at <= now)
            .take(options.max_messages)
            .map(|e| {
                e.visible_at = now + options.visibility_timeout;
                e.message.clone()
            })
            .collect()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn receive(&self, options: ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError> {
        let deadline = tokio::time::Instant::now() + options.wait;
        loop {
            // register interest before checking so a concurrent send is not missed
            let arrived = self.arrived.notified();
            {
                let mut entries = self.entries.lock().await;
                let batch = Self::take_visible(&mut entries, &options);
                if !batch.is_empty() {
                    return Ok(batch);
                }
            }
            if tokio::time::timeout_at(deadline, arrived).await.is_err() {
                return Ok(Vec::new());
            }
        }
    }

    async fn send(&self, body: &str) -> Result<String, QueueError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.entries.lock().await.push(Entry {
            message: QueueMessage {
                id: id.clone(),
                body: body.to_string(),
            },
            visible_at: Instant::now(),
        });
        self.arrived.notify_waiters();
        Ok(id)
    }

    async fn delete(&self, message_id: &str) -> Result<(), QueueError> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.message.id != message_id);
        if entries.len() == before {
            return Err(QueueError::UnknownMessage {
                queue: self.name.clone(),
                message_id: message_id.to_string(),
            });
        }
        Ok(())
    }

    async fn peek(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError> {
        Ok(self
            .entries
            .lock()
            .await
            .iter()
            .take(max_messages)
            .map(|e| e.message.clone())
            .collect())
    }

    async fn count(&self) -> Result<u64, QueueError> {
        Ok(self.entries.lock().await.len() as u64)
    }

    async fn ping(&self) -> Result<(), QueueError> {
        Ok(())
    }
}
