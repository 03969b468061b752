//! Instruction Store
//!
//! Sole owner of persistent payment state. Two backends implement
//! [`InstructionStore`]:
//! - [`PgInstructionStore`]: PostgreSQL, one JSONB document per instruction
//! - [`InMemoryInstructionStore`]: process-local, for tests and local runs
//!
//! # Contract
//!
//! 1. **Duplicate detection**: `store` refuses an instruction whose duplicate
//!    key matches a row outside Failed/Rejected, unless the candidate itself is
//!    Failed/Rejected. The refusal carries the existing id.
//! 2. **Atomic updates**: `update_payment` appends the event, sets the status
//!    and bumps the version in one row-level operation.
//! 3. **Idempotency**: an update whose event id is already in the log, or whose
//!    transition is not allowed from the current status, is skipped.
//! 4. **No internal retry**: transient failures surface as `PaymentError::Transient`.

pub mod memory;
pub mod postgres;
pub mod report;

pub use memory::InMemoryInstructionStore;
pub use postgres::PgInstructionStore;
pub use report::{CurrencyReport, CurrencySummary, Report};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::payment::{PaymentError, PaymentEvent, PaymentId, PaymentInstruction, PaymentStatus};

/// Result of an `update_payment` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Event appended; carries the new version
    Applied { version: i32 },
    /// Event already present or transition not allowed; nothing changed
    Skipped { status: PaymentStatus },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Applied { .. })
    }
}

#[async_trait]
pub trait InstructionStore: Send + Sync {
    /// Persist a new aggregate. Returns the stored copy (correlation id filled in).
    async fn store(&self, instruction: &PaymentInstruction)
    -> Result<PaymentInstruction, PaymentError>;

    async fn update_payment(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        event: PaymentEvent,
    ) -> Result<UpdateOutcome, PaymentError>;

    async fn get(&self, id: PaymentId) -> Result<PaymentInstruction, PaymentError>;

    /// Empty result is reported as `NotFound`
    async fn get_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<PaymentInstruction>, PaymentError>;

    /// Most recently created instruction for the merchant on that execution day
    async fn get_by_merchant_for_day(
        &self,
        mid: &str,
        day: NaiveDate,
    ) -> Result<PaymentInstruction, PaymentError>;

    async fn report_for(&self, day: NaiveDate) -> Result<Report, PaymentError>;

    async fn currency_report_for(&self, day: NaiveDate) -> Result<CurrencyReport, PaymentError>;

    async fn ping(&self) -> Result<(), PaymentError>;
}

/// Assign a fresh correlation id when the caller left it empty
pub(crate) fn with_correlation_id(instruction: &PaymentInstruction) -> PaymentInstruction {
    let mut stored = instruction.clone();
    if stored
        .incoming_instruction
        .payment_correlation_id
        .trim()
        .is_empty()
    {
        stored.incoming_instruction.payment_correlation_id = uuid::Uuid::new_v4().to_string();
    }
    stored
}
