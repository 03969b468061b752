//! Provider state updates arriving on the provider-events queue.

pub mod consumer;
pub mod message;

pub use consumer::{EventConsumerConfig, EventOutcome, ProviderEventConsumer};
pub use message::{ProviderStateUpdate, UpdatedState};
