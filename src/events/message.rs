//! Provider state-update message:
//! `{"payment_instruction_id":"<uuid>","updated_state":"PROCESSED|FAILED|REJECTED","reason":{"code":"..","message":".."}}`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payment::{PaymentEvent, PaymentId, PaymentStatus, Reason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdatedState {
    Processed,
    Failed,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStateUpdate {
    pub payment_instruction_id: String,
    pub updated_state: UpdatedState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
}

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Malformed state update: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid payment_instruction_id {0:?}")]
    InvalidId(String),
}

/// Store call derived from one update
#[derive(Debug, Clone)]
pub struct Transition {
    pub id: PaymentId,
    pub status: PaymentStatus,
    pub event: PaymentEvent,
}

impl ProviderStateUpdate {
    pub fn parse(body: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(body)?)
    }

    /// `event_id` makes redelivery of the same message a no-op
    pub fn transition(&self, event_id: &str) -> Result<Transition, MessageError> {
        let id = self
            .payment_instruction_id
            .parse::<PaymentId>()
            .map_err(|_| MessageError::InvalidId(self.payment_instruction_id.clone()))?;
        let reason = self.reason.clone();
        let (status, event) = match self.updated_state {
            UpdatedState::Processed => (PaymentStatus::Successful, PaymentEvent::processing_succeeded()),
            UpdatedState::Failed => (PaymentStatus::Failed, PaymentEvent::processing_failed(reason)),
            UpdatedState::Rejected => (PaymentStatus::Rejected, PaymentEvent::processing_rejected(reason)),
        };
        Ok(Transition {
            id,
            status,
            event: event.with_id(event_id),
        })
    }
}
