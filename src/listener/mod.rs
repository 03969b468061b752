//! UFX file ingestion
//!
//! `FileListener` turns object-created notifications into batches for the
//! `IngestionPipeline`, which replay also drives directly.

pub mod envelope;
pub mod file_listener;
pub mod pipeline;
pub mod summary;

pub use file_listener::{FileListener, ListenerConfig, MessageOutcome};
pub use pipeline::{BatchOutcome, IngestionPipeline, replay_path};
pub use summary::{CurrencyKey, sum_by_currency};
