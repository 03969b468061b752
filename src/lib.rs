//! Settlements Processor
//!
//! Ingests UFX settlement batches, turns every document into a payment
//! instruction, deduplicates against the instruction store, routes to a
//! payment provider and tracks each instruction through its lifecycle.
//!
//! # Modules
//!
//! - [`payment`] - Instruction aggregate, status machine, error kinds
//! - [`store`] - Instruction store (PostgreSQL / in-memory) and reports
//! - [`ufx`] - UFX XML decoding, currency filtering, IBAN synthesis
//! - [`listener`] - Notification-driven file ingestion and the batch pipeline
//! - [`usecase`] - Make-payment use case
//! - [`provider`] - Outbound channel, provider clients, dispatcher
//! - [`events`] - Provider state-update consumer
//! - [`funding`] - Balance gate over the funding API
//! - [`queue`] / [`storage`] - Message queue and object store capabilities
//! - [`gateway`] - HTTP API
//! - [`health`] - Dependency health sweeper

pub mod client;
pub mod config;
pub mod db;
pub mod events;
pub mod feature_flags;
pub mod funding;
pub mod gateway;
pub mod health;
pub mod listener;
pub mod logging;
pub mod payment;
pub mod provider;
pub mod queue;
pub mod replay;
pub mod reporting;
pub mod shutdown;
pub mod storage;
pub mod store;
pub mod ufx;
pub mod usecase;

// Convenient re-exports at crate root
pub use payment::{
    IncomingInstruction, PaymentError, PaymentEvent, PaymentId, PaymentInstruction, PaymentStatus,
};
pub use shutdown::ShutdownSignal;
pub use store::{InstructionStore, UpdateOutcome};
