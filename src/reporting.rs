//! Reporting query: read-only views over the instruction store, bucketed by
//! `executionDate` rather than insertion time.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::payment::{PaymentError, PaymentInstruction};
use crate::store::{CurrencyReport, InstructionStore, Report};

#[derive(Clone)]
pub struct ReportingQuery {
    store: Arc<dyn InstructionStore>,
}

impl ReportingQuery {
    pub fn new(store: Arc<dyn InstructionStore>) -> Self {
        Self { store }
    }

    pub fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Status summary; defaults to today (UTC). An empty day is not an error.
    pub async fn report(&self, day: Option<NaiveDate>) -> Result<Report, PaymentError> {
        self.store.report_for(day.unwrap_or_else(Self::today)).await
    }

    pub async fn currency_report(&self, day: Option<NaiveDate>) -> Result<CurrencyReport, PaymentError> {
        self.store
            .currency_report_for(day.unwrap_or_else(Self::today))
            .await
    }

    pub async fn by_merchant(&self, mid: &str, day: NaiveDate) -> Result<PaymentInstruction, PaymentError> {
        self.store.get_by_merchant_for_day(mid, day).await
    }
}
