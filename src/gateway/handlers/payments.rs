//! Payment instruction endpoints

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::error::{ApiError, ApiResult, ErrorBody};
use super::super::state::AppState;
use crate::payment::{IncomingInstruction, PaymentId, PaymentInstruction};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    #[schema(value_type = String, example = "6f1c2b9e-4c6a-4f38-9d6e-2b8f0c1d2e3f")]
    pub id: PaymentId,
}

/// Submit a payment instruction
///
/// An instruction failing validation is still accepted and stored as
/// `Rejected`; a duplicate resolves to the id of the existing instruction.
#[utoipa::path(
    post,
    path = "/payments",
    request_body(content = String, description = "IncomingInstruction JSON", content_type = "application/json"),
    responses(
        (status = 201, description = "Instruction stored", body = CreatedResponse),
        (status = 400, description = "Body is not a valid instruction", body = ErrorBody),
        (status = 500, description = "Store failure", body = ErrorBody)
    ),
    tag = "Payments"
)]
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let incoming: IncomingInstruction = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid instruction: {}", e)))?;
    let id = state.make_payment.execute(incoming).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// Fetch one payment instruction with its full event log
#[utoipa::path(
    get,
    path = "/payments/{id}",
    params(("id" = String, Path, description = "Payment instruction id (UUID)")),
    responses(
        (status = 200, description = "PaymentInstruction JSON"),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "Unknown id", body = ErrorBody)
    ),
    tag = "Payments"
)]
pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<PaymentInstruction>> {
    let id: PaymentId = id
        .parse()
        .map_err(|_| ApiError::bad_request(format!("invalid payment id: {:?}", id)))?;
    Ok(Json(state.store.get(id).await?))
}
