//! Report aggregation over one execution day.
//!
//! Both store backends select the day's instructions (`executionDate` in
//! `[day, day+1)`) and fold them through the functions here, so the two
//! backends cannot drift apart.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::payment::{PaymentInstruction, PaymentStatus};

/// Daily status summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(with = "crate::payment::types::execution_date")]
    #[schema(value_type = String, example = "2021-06-30")]
    pub date: NaiveDate,
    pub total: u64,
    /// Count per status; every status is present
    pub statuses: BTreeMap<String, u64>,
    /// Failed/Rejected count per domain failure reason code
    pub failed_payments: BTreeMap<String, u64>,
}

impl Report {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total: 0,
            statuses: PaymentStatus::ALL
                .into_iter()
                .map(|s| (s.to_string(), 0))
                .collect(),
            failed_payments: BTreeMap::new(),
        }
    }

    pub fn aggregate<'a>(
        date: NaiveDate,
        instructions: impl IntoIterator<Item = &'a PaymentInstruction>,
    ) -> Self {
        let mut report = Self::empty(date);
        for instruction in instructions {
            if instruction.execution_date() != date {
                continue;
            }
            report.total += 1;
            *report
                .statuses
                .entry(instruction.status.to_string())
                .or_default() += 1;
            if instruction.status.is_terminal_failure() {
                *report
                    .failed_payments
                    .entry(instruction.domain_failure_reason_code())
                    .or_default() += 1;
            }
        }
        report
    }

    pub fn count(&self, status: PaymentStatus) -> u64 {
        self.statuses.get(status.as_str()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencySummary {
    pub successful: u64,
    pub failures: u64,
    pub total: u64,
    #[schema(value_type = String, example = "1250.50")]
    pub successful_amount: Decimal,
    #[schema(value_type = String, example = "0")]
    pub failures_amount: Decimal,
    #[schema(value_type = String, example = "1250.50")]
    pub total_amount: Decimal,
}

/// Per-currency breakdown keyed by ISO code, `_HR` suffix for high-risk merchants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyReport {
    #[serde(with = "crate::payment::types::execution_date")]
    #[schema(value_type = String, example = "2021-06-30")]
    pub date: NaiveDate,
    pub currencies: BTreeMap<String, CurrencySummary>,
}

impl CurrencyReport {
    pub fn aggregate<'a>(
        date: NaiveDate,
        instructions: impl IntoIterator<Item = &'a PaymentInstruction>,
    ) -> Self {
        let mut currencies: BTreeMap<String, CurrencySummary> = BTreeMap::new();
        for instruction in instructions {
            if instruction.execution_date() != date {
                continue;
            }
            let incoming = &instruction.incoming_instruction;
            let amount = match incoming.payment.amount.trim().parse::<Decimal>() {
                Ok(amount) => amount,
                Err(_) => {
                    tracing::warn!(
                        payment_id = %instruction.id,
                        amount = %incoming.payment.amount,
                        "Unparsable amount excluded from currency totals"
                    );
                    Decimal::ZERO
                }
            };

            let summary = currencies.entry(incoming.currency_report_key()).or_default();
            summary.total += 1;
            summary.total_amount += amount;
            match instruction.status {
                PaymentStatus::Successful => {
                    summary.successful += 1;
                    summary.successful_amount += amount;
                }
                PaymentStatus::Failed | PaymentStatus::Rejected => {
                    summary.failures += 1;
                    summary.failures_amount += amount;
                }
                _ => {}
            }
        }
        Self { date, currencies }
    }
}
