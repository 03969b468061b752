//! File listener: one notification at a time, end to end.
//!
//! ```text
//! receive ─→ envelope key ─→ object fetch ─→ UFX decode ─→ pipeline ─→ delete
//!                 │               │               │            │
//!                 └───────────────┴───────────────┴────────────┴─→ dead-letter
//! ```
//!
//! Only whole-file faults dead-letter. A dead-lettered message is forwarded
//! to the DLQ first and deleted from the input queue second; if forwarding
//! fails it stays on the input queue for redelivery.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::envelope::{EnvelopeError, object_key};
use super::pipeline::{BatchOutcome, IngestionPipeline, PipelineError};
use crate::feature_flags::FeatureFlags;
use crate::queue::{MessageQueue, QueueError, QueueMessage, ReceiveOptions};
use crate::shutdown::ShutdownSignal;
use crate::storage::{ObjectStore, ObjectStoreError};
use crate::ufx::{self, UfxError};

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub receive: ReceiveOptions,
    /// Pause while ingestion is switched off
    pub disabled_sleep: Duration,
    /// Pause after a failed receive
    pub error_backoff: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            receive: ReceiveOptions::default(),
            disabled_sleep: Duration::from_secs(5),
            error_backoff: Duration::from_secs(1),
        }
    }
}

/// Whole-file faults
#[derive(Error, Debug)]
pub enum FileFault {
    #[error("Bad notification envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Cannot fetch file: {0}")]
    Fetch(#[from] ObjectStoreError),

    #[error("Cannot decode file: {0}")]
    Decode(#[from] UfxError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug)]
pub enum MessageOutcome {
    Processed(BatchOutcome),
    DeadLettered(String),
}

pub struct FileListener {
    notifications: Arc<dyn MessageQueue>,
    dead_letters: Arc<dyn MessageQueue>,
    objects: Arc<dyn ObjectStore>,
    pipeline: Arc<IngestionPipeline>,
    flags: Arc<dyn FeatureFlags>,
    config: ListenerConfig,
    shutdown: ShutdownSignal,
}

impl FileListener {
    pub fn new(
        notifications: Arc<dyn MessageQueue>,
        dead_letters: Arc<dyn MessageQueue>,
        objects: Arc<dyn ObjectStore>,
        pipeline: Arc<IngestionPipeline>,
        flags: Arc<dyn FeatureFlags>,
        config: ListenerConfig,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            notifications,
            dead_letters,
            objects,
            pipeline,
            flags,
            config,
            shutdown,
        }
    }

    pub async fn run(&self) {
        info!(
            queue = %self.notifications.name(),
            dlq = %self.dead_letters.name(),
            "File listener started"
        );
        while !self.shutdown.is_triggered() {
            if !self.flags.ingestion_enabled() {
                debug!("Ingestion disabled, sleeping");
                self.pause(self.config.disabled_sleep).await;
                continue;
            }

            let received = tokio::select! {
                _ = self.shutdown.wait() => break,
                received = self.notifications.receive(self.config.receive) => received,
            };
            let messages = match received {
                Ok(messages) => messages,
                Err(e) => {
                    error!(error = %e, "Notification receive failed");
                    self.pause(self.config.error_backoff).await;
                    continue;
                }
            };

            for message in &messages {
                if let Err(e) = self.handle_message(message).await {
                    // left on the queue; redelivered after the visibility timeout
                    error!(message_id = %message.id, error = %e, "Notification not settled");
                }
            }
        }
        info!("File listener stopped");
    }

    async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = self.shutdown.wait() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    /// Process one notification and settle it (delete or dead-letter)
    pub async fn handle_message(&self, message: &QueueMessage) -> Result<MessageOutcome, QueueError> {
        match self.ingest(&message.body).await {
            Ok(outcome) => {
                self.notifications.delete(&message.id).await?;
                Ok(MessageOutcome::Processed(outcome))
            }
            Err(fault) => {
                warn!(message_id = %message.id, error = %fault, "Dead-lettering notification");
                self.dead_letters.send(&message.body).await?;
                self.notifications.delete(&message.id).await?;
                Ok(MessageOutcome::DeadLettered(fault.to_string()))
            }
        }
    }

    async fn ingest(&self, body: &str) -> Result<BatchOutcome, FileFault> {
        let key = object_key(body)?;
        let bytes = self.objects.get(&key).await?;
        let instructions = ufx::decode(&bytes, &key)?;
        Ok(self.pipeline.process(&key, instructions).await?)
    }
}
