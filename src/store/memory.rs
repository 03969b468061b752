//! In-memory instruction store.
//!
//! A single async `RwLock` guards all rows, which serializes updates per id
//! (and globally). Insertion order is kept for "most recent" lookups.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;

use super::report::{CurrencyReport, Report};
use super::{InstructionStore, UpdateOutcome, with_correlation_id};
use crate::payment::{
    PaymentError, PaymentEvent, PaymentId, PaymentInstruction, PaymentStatus,
};

#[derive(Default)]
struct Rows {
    by_id: HashMap<PaymentId, PaymentInstruction>,
    order: Vec<PaymentId>,
}

impl Rows {
    fn in_order(&self) -> impl Iterator<Item = &PaymentInstruction> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

#[derive(Default)]
pub struct InMemoryInstructionStore {
    rows: RwLock<Rows>,
}

impl InMemoryInstructionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every row in insertion order
    pub async fn all(&self) -> Vec<PaymentInstruction> {
        self.rows.read().await.in_order().cloned().collect()
    }
}

#[async_trait]
impl InstructionStore for InMemoryInstructionStore {
    async fn store(
        &self,
        instruction: &PaymentInstruction,
    ) -> Result<PaymentInstruction, PaymentError> {
        let mut rows = self.rows.write().await;

        if rows.by_id.contains_key(&instruction.id) {
            return Err(PaymentError::Duplicate {
                existing_id: instruction.id,
            });
        }

        if !instruction.status.is_terminal_failure() {
            let key = instruction.duplicate_key();
            if let Some(existing) = rows
                .in_order()
                .find(|row| !row.status.is_terminal_failure() && row.duplicate_key() == key)
            {
                debug!(existing_id = %existing.id, key = %key, "Duplicate instruction refused");
                return Err(PaymentError::Duplicate {
                    existing_id: existing.id,
                });
            }
        }

        let stored = with_correlation_id(instruction);
        rows.order.push(stored.id);
        rows.by_id.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_payment(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        event: PaymentEvent,
    ) -> Result<UpdateOutcome, PaymentError> {
        let mut rows = self.rows.write().await;
        let row = rows
            .by_id
            .get_mut(&id)
            .ok_or_else(|| PaymentError::NotFound(format!("payment instruction {}", id)))?;

        if row.apply(status, event) {
            Ok(UpdateOutcome::Applied {
                version: row.version,
            })
        } else {
            Ok(UpdateOutcome::Skipped { status: row.status })
        }
    }

    async fn get(&self, id: PaymentId) -> Result<PaymentInstruction, PaymentError> {
        self.rows
            .read()
            .await
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("payment instruction {}", id)))
    }

    async fn get_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> Result<Vec<PaymentInstruction>, PaymentError> {
        let found: Vec<PaymentInstruction> = self
            .rows
            .read()
            .await
            .in_order()
            .filter(|row| row.incoming_instruction.payment_correlation_id == correlation_id)
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(PaymentError::NotFound(format!(
                "correlation id {}",
                correlation_id
            )));
        }
        Ok(found)
    }

    async fn get_by_merchant_for_day(
        &self,
        mid: &str,
        day: NaiveDate,
    ) -> Result<PaymentInstruction, PaymentError> {
        self.rows
            .read()
            .await
            .in_order()
            .filter(|row| {
                row.incoming_instruction.merchant.contract_number == mid
                    && row.execution_date() == day
            })
            .last()
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("merchant {} on {}", mid, day)))
    }

    async fn report_for(&self, day: NaiveDate) -> Result<Report, PaymentError> {
        let rows = self.rows.read().await;
        Ok(Report::aggregate(day, rows.in_order()))
    }

    async fn currency_report_for(&self, day: NaiveDate) -> Result<CurrencyReport, PaymentError> {
        let rows = self.rows.read().await;
        Ok(CurrencyReport::aggregate(day, rows.in_order()))
    }

    async fn ping(&self) -> Result<(), PaymentError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::types::fixtures::incoming;
    use crate::payment::{PaymentProvider, Reason};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()
    }

    fn received(mid: &str, amount: &str) -> PaymentInstruction {
        PaymentInstruction::received(incoming(mid, amount, "EUR", day()), PaymentProvider::CrossBorder)
    }

    #[tokio::test]
    async fn test_store_then_get_returns_equal_aggregate() {
        let store = InMemoryInstructionStore::new();
        let instruction = received("1", "10");
        let stored = store.store(&instruction).await.unwrap();

        assert!(!stored.incoming_instruction.payment_correlation_id.is_empty());
        assert_eq!(store.get(instruction.id).await.unwrap(), stored);
    }

    #[tokio::test]
    async fn test_duplicate_refused_with_existing_id() {
        let store = InMemoryInstructionStore::new();
        let first = received("1", "10");
        store.store(&first).await.unwrap();

        let err = store.store(&received("1", "10")).await.unwrap_err();
        assert_eq!(err, PaymentError::Duplicate { existing_id: first.id });
        assert_eq!(store.len().await, 1);

        // different amount is a different key
        assert!(store.store(&received("1", "11")).await.is_ok());
    }

    #[tokio::test]
    async fn test_terminal_failure_rows_bypass_duplicate_check() {
        let store = InMemoryInstructionStore::new();
        let first = received("1", "10");
        store.store(&first).await.unwrap();
        store
            .update_payment(
                first.id,
                PaymentStatus::Failed,
                PaymentEvent::processing_failed(Some(Reason::new("AC04", "closed"))),
            )
            .await
            .unwrap();

        let replay = received("1", "10");
        store.store(&replay).await.unwrap();
        assert_eq!(store.len().await, 2);

        // a rejected candidate is stored even though `replay` is active
        let rejected = PaymentInstruction::rejected(
            incoming("1", "10", "EUR", day()),
            PaymentProvider::CrossBorder,
            Reason::new("INVALID_CURRENCY", "bad"),
        );
        store.store(&rejected).await.unwrap();
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_update_is_idempotent_per_event_id() {
        let store = InMemoryInstructionStore::new();
        let instruction = received("1", "10");
        store.store(&instruction).await.unwrap();

        let event = PaymentEvent::processing_succeeded().with_id("msg-1");
        let first = store
            .update_payment(instruction.id, PaymentStatus::Successful, event.clone())
            .await
            .unwrap();
        assert_eq!(first, UpdateOutcome::Applied { version: 2 });

        let again = store
            .update_payment(instruction.id, PaymentStatus::Successful, event)
            .await
            .unwrap();
        assert_eq!(
            again,
            UpdateOutcome::Skipped {
                status: PaymentStatus::Successful
            }
        );
        assert_eq!(store.get(instruction.id).await.unwrap().events.len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let store = InMemoryInstructionStore::new();
        let err = store
            .update_payment(
                PaymentId::new(),
                PaymentStatus::Successful,
                PaymentEvent::processing_succeeded(),
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = InMemoryInstructionStore::new();
        let mut with_cid = received("77", "10");
        with_cid.incoming_instruction.payment_correlation_id = "batch-1".to_string();
        store.store(&with_cid).await.unwrap();
        let later = received("77", "20");
        store.store(&later).await.unwrap();

        let by_cid = store.get_by_correlation_id("batch-1").await.unwrap();
        assert_eq!(by_cid.len(), 1);
        assert!(store.get_by_correlation_id("nope").await.unwrap_err().is_not_found());

        let by_mid = store.get_by_merchant_for_day("77", day()).await.unwrap();
        assert_eq!(by_mid.id, later.id);
        assert!(
            store
                .get_by_merchant_for_day("77", day().succ_opt().unwrap())
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_empty_day_report_is_not_an_error() {
        let store = InMemoryInstructionStore::new();
        let report = store.report_for(day()).await.unwrap();
        assert_eq!(report.total, 0);
        let currencies = store.currency_report_for(day()).await.unwrap();
        assert!(currencies.currencies.is_empty());
    }
}
