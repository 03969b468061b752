//! Payment Error Types
//!
//! The four error kinds surfaced by the instruction store and the use cases.

use thiserror::Error;

use super::types::PaymentId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Input malformed (bad currency, bad amount, bad date)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Store refused an insert violating the duplicate-key invariant
    #[error("Duplicate payment instruction (existing id {existing_id})")]
    Duplicate { existing_id: PaymentId },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Database, queue or provider I/O failure
    #[error("Transient infrastructure error: {0}")]
    Transient(String),
}

impl PaymentError {
    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            PaymentError::Validation(_) => "VALIDATION_ERROR",
            PaymentError::Duplicate { .. } => "DUPLICATE",
            PaymentError::NotFound(_) => "NOT_FOUND",
            PaymentError::Transient(_) => "TRANSIENT_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            PaymentError::Validation(_) => 400,
            PaymentError::Duplicate { .. } => 409,
            PaymentError::NotFound(_) => 404,
            PaymentError::Transient(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PaymentError::NotFound(_))
    }
}

impl From<sqlx::Error> for PaymentError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => PaymentError::NotFound("row not found".to_string()),
            other => PaymentError::Transient(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PaymentError {
    fn from(e: serde_json::Error) -> Self {
        PaymentError::Transient(format!("document encoding: {}", e))
    }
}
