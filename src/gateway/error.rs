//! API error type and the `{code, msg}` error body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::payment::PaymentError;
use crate::queue::QueueError;
use crate::replay::ReplayError;
use crate::storage::ObjectStoreError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    #[schema(example = "NOT_FOUND")]
    pub code: String,
    #[schema(example = "payment instruction not found")]
    pub msg: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_PARAMETER", msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, error = %self.msg, "Request failed");
        }
        // internal details stay in the log
        let msg = if self.status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal error".to_string()
        } else {
            self.msg
        };
        let body = ErrorBody {
            code: self.code.to_string(),
            msg,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<PaymentError> for ApiError {
    fn from(e: PaymentError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.code(), e.to_string())
    }
}

impl From<QueueError> for ApiError {
    fn from(e: QueueError) -> Self {
        Self::internal(e.to_string())
    }
}

impl From<ReplayError> for ApiError {
    fn from(e: ReplayError) -> Self {
        match e {
            ReplayError::UnknownAction(_) | ReplayError::UnknownCurrency(_) => {
                Self::bad_request(e.to_string())
            }
            ReplayError::ObjectStore(ObjectStoreError::NotFound(_)) => Self::not_found(e.to_string()),
            ReplayError::ObjectStore(ObjectStoreError::InvalidKey(_)) => {
                Self::bad_request(e.to_string())
            }
            ReplayError::Ufx(_) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_FILE", e.to_string()),
            ReplayError::ObjectStore(_) | ReplayError::Pipeline(_) => Self::internal(e.to_string()),
        }
    }
}
