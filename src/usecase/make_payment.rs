//! Make-Payment use case
//!
//! 1. Validate currency and amount; an invalid instruction is persisted
//!    directly as `Rejected` and its id returned.
//! 2. Select the provider from `(sender, currency)`.
//! 3. Persist a `Received` aggregate. A duplicate resolves to the existing id;
//!    it is enqueued again only while still `Received` (hand-off never happened).
//! 4. Enqueue the aggregate on the bounded provider channel.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::payment::currency;
use crate::payment::{
    IncomingInstruction, PaymentError, PaymentId, PaymentInstruction, PaymentProvider,
    PaymentStatus, Reason,
};
use crate::provider::OutboundSender;
use crate::store::InstructionStore;

pub const INVALID_CURRENCY: &str = "INVALID_CURRENCY";
pub const INVALID_AMOUNT: &str = "INVALID_AMOUNT";

pub struct MakePayment {
    store: Arc<dyn InstructionStore>,
    outbound: OutboundSender,
}

impl MakePayment {
    pub fn new(store: Arc<dyn InstructionStore>, outbound: OutboundSender) -> Self {
        Self { store, outbound }
    }

    pub async fn execute(&self, mut incoming: IncomingInstruction) -> Result<PaymentId, PaymentError> {
        let sender = if incoming.metadata.sender.trim().is_empty() {
            incoming.payment.sender.clone()
        } else {
            incoming.metadata.sender.clone()
        };
        let provider = PaymentProvider::select(&sender, &incoming.payment.currency.iso_code);

        if let Err(reason) = normalize(&mut incoming) {
            warn!(
                mid = %incoming.merchant.contract_number,
                code = %reason.code,
                reason = %reason.message,
                "Instruction rejected by validation"
            );
            let rejected = PaymentInstruction::rejected(incoming, provider, reason);
            let stored = self.store.store(&rejected).await?;
            return Ok(stored.id);
        }

        let instruction = PaymentInstruction::received(incoming, provider);
        let stored = match self.store.store(&instruction).await {
            Ok(stored) => stored,
            Err(PaymentError::Duplicate { existing_id }) => {
                debug!(
                    existing_id = %existing_id,
                    key = %instruction.duplicate_key(),
                    "Duplicate submission resolved to existing instruction"
                );
                let existing = self.store.get(existing_id).await?;
                if existing.status == PaymentStatus::Received {
                    info!(payment_id = %existing_id, "Re-enqueueing instruction never handed to a provider");
                    self.outbound.send(existing).await?;
                }
                return Ok(existing_id);
            }
            Err(e) => return Err(e),
        };

        let id = stored.id;
        info!(
            payment_id = %id,
            provider = %provider,
            mid = %stored.incoming_instruction.merchant.contract_number,
            "Payment instruction received"
        );
        self.outbound.send(stored).await?;
        Ok(id)
    }
}

/// Validate and canonicalize the currency fields in place
fn normalize(incoming: &mut IncomingInstruction) -> Result<(), Reason> {
    let currency = &mut incoming.payment.currency;
    let code = currency.iso_code.trim().to_ascii_uppercase();
    let Some(number) = currency::iso_number_for(&code) else {
        return Err(Reason::new(
            INVALID_CURRENCY,
            format!("unknown currency code {:?}", currency.iso_code),
        ));
    };
    currency.iso_code = code;
    if currency.iso_number.trim().is_empty() {
        currency.iso_number = number.to_string();
    }

    let amount = incoming.payment.amount.trim();
    if Decimal::from_str(amount).is_err() {
        return Err(Reason::new(
            INVALID_AMOUNT,
            format!("amount {:?} is not a decimal", incoming.payment.amount),
        ));
    }
    Ok(())
}
