//! Message queues
//!
//! The listener polls the notification queue, writes whole-file faults to the
//! dead-letter queue, and the event consumer polls the provider-events queue.
//! Delivery is at-least-once: a received message stays invisible for the
//! visibility timeout and reappears unless it is deleted.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryQueue;
pub use postgres::PgMessageQueue;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QueueMessage {
    /// Stable across redeliveries of the same message
    pub id: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiveOptions {
    pub max_messages: usize,
    /// Long-poll: how long to wait for the first message
    pub wait: Duration,
    pub visibility_timeout: Duration,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            wait: Duration::from_secs(20),
            visibility_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Queue database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unknown message {message_id} on queue {queue}")]
    UnknownMessage { queue: String, message_id: String },
}

#[async_trait]
pub trait MessageQueue: Send + Sync {
    fn name(&self) -> &str;

    async fn receive(&self, options: ReceiveOptions) -> Result<Vec<QueueMessage>, QueueError>;

    /// Enqueue a body; returns the new message id
    async fn send(&self, body: &str) -> Result<String, QueueError>;

    async fn delete(&self, message_id: &str) -> Result<(), QueueError>;

    /// Read without receiving; visibility is not touched
    async fn peek(&self, max_messages: usize) -> Result<Vec<QueueMessage>, QueueError>;

    async fn count(&self) -> Result<u64, QueueError>;

    async fn ping(&self) -> Result<(), QueueError>;
}
