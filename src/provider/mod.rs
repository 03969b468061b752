//! Downstream payment providers
//!
//! Persisted `Received` instructions flow through a bounded channel to the
//! dispatcher, which hands each one to the client for its provider and then
//! records `SubmittedForProcessing`. The providers answer later through the
//! provider-events queue (see `events`).

pub mod channel;
pub mod dispatcher;
pub mod http;

pub use channel::{OutboundReceiver, OutboundSender, outbound_channel};
pub use dispatcher::ProviderDispatcher;
pub use http::HttpProviderClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::payment::PaymentInstruction;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No client configured for provider {0}")]
    Unrouted(String),
}

#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Hand the instruction off; returns the provider's reference for it
    async fn submit(&self, instruction: &PaymentInstruction) -> Result<String, ProviderError>;
}
