//! Ingestion pipeline shared by the file listener and replay.
//!
//! decoded instructions → per-currency sums → balance gate → make-payment.
//! Per-instruction failures are collected, never escalated to the batch.

use std::collections::BTreeSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use super::summary::{SummaryError, sum_by_currency};
use crate::funding::BalanceGate;
use crate::payment::currency;
use crate::payment::{IncomingInstruction, PaymentError, PaymentId};
use crate::usecase::MakePayment;

pub const REPLAY_ACTION: &str = "pay_currency_from_file";

/// Admin call that re-ingests one currency of a file
pub fn replay_path(currency: &str, filename: &str) -> String {
    format!(
        "POST /replay-payment?action={}&currency={}&file={}",
        REPLAY_ACTION, currency, filename
    )
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Cannot summarize batch: {0}")]
    Summary(#[from] SummaryError),
}

#[derive(Debug)]
pub struct InstructionFailure {
    pub mid: String,
    pub error: PaymentError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub decoded: usize,
    pub submitted: Vec<PaymentId>,
    pub failures: Vec<InstructionFailure>,
    /// Currencies held back for insufficient funding
    pub withheld: Vec<String>,
}

pub struct IngestionPipeline {
    gate: BalanceGate,
    make_payment: Arc<MakePayment>,
}

impl IngestionPipeline {
    pub fn new(gate: BalanceGate, make_payment: Arc<MakePayment>) -> Self {
        Self { gate, make_payment }
    }

    pub async fn process(
        &self,
        filename: &str,
        instructions: Vec<IncomingInstruction>,
    ) -> Result<BatchOutcome, PipelineError> {
        let mut outcome = BatchOutcome {
            decoded: instructions.len(),
            ..Default::default()
        };
        let totals = sum_by_currency(&instructions)?;

        let mut withheld: BTreeSet<(String, bool)> = BTreeSet::new();
        for (key, total) in &totals {
            if currency::is_domestic(&key.iso_code) || !currency::is_known(&key.iso_code) {
                continue;
            }
            match self.gate.has_balance(&key.iso_code, *total, key.high_risk).await {
                Ok(true) => {}
                Ok(false) => {
                    let advice = replay_path(&key.iso_code, filename);
                    warn!(
                        filename = %filename,
                        currency = %key.iso_code,
                        high_risk = key.high_risk,
                        amount = %total,
                        replay = %advice,
                        "Insufficient funding balance, currency withheld. Replay with: {}",
                        advice
                    );
                    withheld.insert((key.iso_code.clone(), key.high_risk));
                    outcome.withheld.push(key.iso_code.clone());
                }
                Err(e) => {
                    // fail open: the instructions go ahead
                    warn!(
                        filename = %filename,
                        currency = %key.iso_code,
                        error = %e,
                        "Balance check failed, proceeding"
                    );
                }
            }
        }

        for incoming in instructions {
            let currency_key = (
                incoming.payment.currency.iso_code.clone(),
                incoming.merchant.high_risk,
            );
            if withheld.contains(&currency_key) {
                continue;
            }
            let mid = incoming.merchant.contract_number.clone();
            match self.make_payment.execute(incoming).await {
                Ok(id) => outcome.submitted.push(id),
                Err(e) => {
                    error!(filename = %filename, mid = %mid, error = %e, "Make-payment failed");
                    outcome.failures.push(InstructionFailure { mid, error: e });
                }
            }
        }

        info!(
            filename = %filename,
            decoded = outcome.decoded,
            submitted = outcome.submitted.len(),
            failed = outcome.failures.len(),
            withheld = ?outcome.withheld,
            "Batch processed"
        );
        Ok(outcome)
    }
}
