//! Admin replay: re-ingest the docs of one currency from an earlier file.
//!
//! Used after an insufficient-balance hold. Instructions already stored are
//! resolved by duplicate detection; only Failed/Rejected tuples and withheld
//! currencies produce new rows.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::listener::{BatchOutcome, IngestionPipeline};
use crate::listener::pipeline::{PipelineError, REPLAY_ACTION};
use crate::payment::currency;
use crate::storage::{ObjectStore, ObjectStoreError};
use crate::ufx::{self, UfxError};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Unsupported replay action: {0:?}")]
    UnknownAction(String),

    #[error("Unknown currency: {0:?}")]
    UnknownCurrency(String),

    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    #[error(transparent)]
    Ufx(#[from] UfxError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

pub struct ReplayService {
    objects: Arc<dyn ObjectStore>,
    pipeline: Arc<IngestionPipeline>,
}

impl ReplayService {
    pub fn new(objects: Arc<dyn ObjectStore>, pipeline: Arc<IngestionPipeline>) -> Self {
        Self { objects, pipeline }
    }

    pub async fn replay(&self, action: &str, currency: &str, file: &str) -> Result<BatchOutcome, ReplayError> {
        if action != REPLAY_ACTION {
            return Err(ReplayError::UnknownAction(action.to_string()));
        }
        self.pay_currency_from_file(currency, file).await
    }

    pub async fn pay_currency_from_file(&self, currency_code: &str, file: &str) -> Result<BatchOutcome, ReplayError> {
        let code = currency_code.trim().to_ascii_uppercase();
        if !currency::is_known(&code) {
            return Err(ReplayError::UnknownCurrency(currency_code.to_string()));
        }

        let bytes = self.objects.get(file).await?;
        let filtered = ufx::filter_currency(&bytes, &code)?;
        let instructions = ufx::decode(&filtered, file)?;
        info!(file = %file, currency = %code, docs = instructions.len(), "Replaying currency from file");

        Ok(self.pipeline.process(file, instructions).await?)
    }
}
