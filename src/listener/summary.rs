use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::payment::IncomingInstruction;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SummaryError {
    #[error("Unparsable amount {amount:?} for merchant {mid}")]
    InvalidAmount { mid: String, amount: String },

    #[error("Amount overflow summing {0}")]
    Overflow(String),
}

/// Aggregate debit of a batch per currency
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CurrencyKey {
    pub iso_code: String,
    pub high_risk: bool,
}

pub fn sum_by_currency(
    instructions: &[IncomingInstruction],
) -> Result<BTreeMap<CurrencyKey, Decimal>, SummaryError> {
    let mut totals: BTreeMap<CurrencyKey, Decimal> = BTreeMap::new();
    for instruction in instructions {
        let raw = instruction.payment.amount.trim();
        let amount = Decimal::from_str(raw).map_err(|_| SummaryError::InvalidAmount {
            mid: instruction.merchant.contract_number.clone(),
            amount: raw.to_string(),
        })?;
        let key = CurrencyKey {
            iso_code: instruction.payment.currency.iso_code.clone(),
            high_risk: instruction.merchant.high_risk,
        };
        let total = totals.entry(key).or_insert(Decimal::ZERO);
        *total = total
            .checked_add(amount)
            .ok_or_else(|| SummaryError::Overflow(instruction.payment.currency.iso_code.clone()))?;
    }
    Ok(totals)
}
