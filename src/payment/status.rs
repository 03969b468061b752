//! Payment Instruction Status
//!
//! Lifecycle of a payment instruction:
//!
//! ```text
//! Received → SubmittedForProcessing → Successful
//!     │               │
//!     │               ├──────────────→ Failed
//!     │               └──────────────→ Rejected
//!     └──→ Successful | Failed | Rejected
//! ```
//!
//! Terminal statuses: Successful, Failed, Rejected.
//! Terminal-failure statuses (Failed, Rejected) are ignored by duplicate detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Persisted by the make-payment use case, not yet handed to a provider
    Received,
    /// Provider adapter accepted the instruction
    SubmittedForProcessing,
    /// Terminal: provider settled the payment
    Successful,
    /// Terminal: provider failed the payment
    Failed,
    /// Terminal: rejected by validation or by the provider
    Rejected,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] = [
        PaymentStatus::Received,
        PaymentStatus::SubmittedForProcessing,
        PaymentStatus::Successful,
        PaymentStatus::Failed,
        PaymentStatus::Rejected,
    ];

    /// No more transitions possible
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Successful | PaymentStatus::Failed | PaymentStatus::Rejected
        )
    }

    /// Failed or Rejected: excluded from duplicate detection so the tuple can be replayed
    #[inline]
    pub fn is_terminal_failure(&self) -> bool {
        matches!(self, PaymentStatus::Failed | PaymentStatus::Rejected)
    }

    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        match self {
            PaymentStatus::Received => next != PaymentStatus::Received,
            PaymentStatus::SubmittedForProcessing => next.is_terminal(),
            _ => false,
        }
    }

    /// Statuses from which `next` is reachable
    pub fn sources_of(next: PaymentStatus) -> Vec<PaymentStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(next))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Received => "Received",
            PaymentStatus::SubmittedForProcessing => "SubmittedForProcessing",
            PaymentStatus::Successful => "Successful",
            PaymentStatus::Failed => "Failed",
            PaymentStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown payment status: {}", s))
    }
}
