//! Provider event consumer.
//!
//! A received batch is split into shards by `payment_instruction_id`. Each
//! shard is applied sequentially, so updates for one instruction keep their
//! arrival order; shards run concurrently. Once an update has to be retried,
//! later updates for the same instruction in that batch are left on the queue
//! as well.
//!
//! | Result                      | Ack |
//! |-----------------------------|-----|
//! | applied / skipped           | yes |
//! | unknown instruction         | yes |
//! | malformed message           | yes |
//! | transient store error       | no  |
//! | behind a retried update     | no  |

use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use super::message::{MessageError, ProviderStateUpdate};
use crate::payment::PaymentError;
use crate::queue::{MessageQueue, QueueMessage, ReceiveOptions};
use crate::shutdown::ShutdownSignal;
use crate::store::{InstructionStore, UpdateOutcome};

#[derive(Debug, Clone)]
pub struct EventConsumerConfig {
    pub receive: ReceiveOptions,
    pub shards: usize,
    pub error_backoff: Duration,
}

impl Default for EventConsumerConfig {
    fn default() -> Self {
        Self {
            receive: ReceiveOptions::default(),
            shards: 8,
            error_backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Applied,
    Skipped,
    UnknownInstruction,
    Malformed,
    /// Left on the queue for redelivery
    Retry,
}

pub fn shard_for(key: &str, shards: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % shards.max(1) as u64) as usize
}

type Parsed = (QueueMessage, Result<ProviderStateUpdate, MessageError>);

pub struct ProviderEventConsumer {
    queue: Arc<dyn MessageQueue>,
    store: Arc<dyn InstructionStore>,
    config: EventConsumerConfig,
    shutdown: ShutdownSignal,
}

impl ProviderEventConsumer {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        store: Arc<dyn InstructionStore>,
        config: EventConsumerConfig,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            queue,
            store,
            config,
            shutdown,
        }
    }

    pub async fn run(&self) {
        info!(queue = %self.queue.name(), shards = self.config.shards, "Provider event consumer started");
        while !self.shutdown.is_triggered() {
            let received = tokio::select! {
                _ = self.shutdown.wait() => break,
                received = self.queue.receive(self.config.receive) => received,
            };
            match received {
                Ok(messages) if !messages.is_empty() => {
                    self.process_batch(messages).await;
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Provider event receive failed");
                    tokio::select! {
                        _ = self.shutdown.wait() => {}
                        _ = tokio::time::sleep(self.config.error_backoff) => {}
                    }
                }
            }
        }
        info!("Provider event consumer stopped");
    }

    /// Apply a batch; returns each message id with its outcome
    pub async fn process_batch(&self, messages: Vec<QueueMessage>) -> Vec<(String, EventOutcome)> {
        let shards = self.config.shards.max(1);
        let mut buckets: Vec<Vec<Parsed>> = (0..shards).map(|_| Vec::new()).collect();
        for message in messages {
            let parsed = ProviderStateUpdate::parse(&message.body);
            let key = match &parsed {
                Ok(update) => update.payment_instruction_id.clone(),
                Err(_) => message.id.clone(),
            };
            buckets[shard_for(&key, shards)].push((message, parsed));
        }

        let results = join_all(buckets.into_iter().map(|bucket| async move {
            let mut outcomes = Vec::with_capacity(bucket.len());
            // ids whose earlier event is waiting for redelivery
            let mut held: HashSet<String> = HashSet::new();
            for (message, parsed) in bucket {
                let instruction_id = parsed
                    .as_ref()
                    .ok()
                    .map(|update| update.payment_instruction_id.clone());
                if let Some(instruction_id) = &instruction_id {
                    if held.contains(instruction_id) {
                        debug!(
                            message_id = %message.id,
                            payment_instruction_id = %instruction_id,
                            "Holding provider event behind an earlier retry"
                        );
                        outcomes.push((message.id, EventOutcome::Retry));
                        continue;
                    }
                }
                let outcome = self.handle(&message, parsed).await;
                if let (EventOutcome::Retry, Some(instruction_id)) = (outcome, instruction_id) {
                    held.insert(instruction_id);
                }
                outcomes.push((message.id, outcome));
            }
            outcomes
        }))
        .await;
        results.into_iter().flatten().collect()
    }

    async fn handle(
        &self,
        message: &QueueMessage,
        parsed: Result<ProviderStateUpdate, MessageError>,
    ) -> EventOutcome {
        let transition = match parsed.and_then(|update| update.transition(&message.id)) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(message_id = %message.id, error = %e, "Discarding malformed provider event");
                self.ack(message).await;
                return EventOutcome::Malformed;
            }
        };

        let id = transition.id;
        let status = transition.status;
        let outcome = match self
            .store
            .update_payment(id, status, transition.event)
            .await
        {
            Ok(UpdateOutcome::Applied { version }) => {
                info!(payment_id = %id, status = %status, version, "Provider event applied");
                EventOutcome::Applied
            }
            Ok(UpdateOutcome::Skipped { status: current }) => {
                debug!(payment_id = %id, requested = %status, current = %current, "Provider event skipped");
                EventOutcome::Skipped
            }
            Err(PaymentError::NotFound(_)) => {
                warn!(payment_id = %id, message_id = %message.id, "Provider event for unknown instruction");
                EventOutcome::UnknownInstruction
            }
            Err(e) => {
                error!(payment_id = %id, error = %e, "Provider event not applied, will be redelivered");
                return EventOutcome::Retry;
            }
        };
        self.ack(message).await;
        outcome
    }

    async fn ack(&self, message: &QueueMessage) {
        if let Err(e) = self.queue.delete(&message.id).await {
            error!(message_id = %message.id, error = %e, "Provider event ack failed");
        }
    }
}
