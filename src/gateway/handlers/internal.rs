//! Operator endpoints: dead-letter inspection and currency replay.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use super::super::error::{ApiError, ApiResult, ErrorBody};
use super::super::state::AppState;
use crate::payment::PaymentId;
use crate::queue::QueueMessage;

/// Messages returned by one inspection call
const PEEK_LIMIT: usize = 100;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeadLetterQueueResponse {
    pub count: u64,
    pub messages: Vec<QueueMessage>,
}

#[utoipa::path(
    get,
    path = "/internal/dead-letter-queues/{name}",
    params(("name" = String, Path, description = "Dead-letter queue name")),
    responses(
        (status = 200, body = DeadLetterQueueResponse),
        (status = 404, description = "No such dead-letter queue", body = ErrorBody)
    ),
    tag = "Internal"
)]
pub async fn get_dead_letter_queue(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<DeadLetterQueueResponse>> {
    let queue = state
        .dead_letter_queues
        .get(&name)
        .ok_or_else(|| ApiError::not_found(format!("unknown dead-letter queue: {}", name)))?;
    let count = queue.count().await?;
    let messages = queue.peek(PEEK_LIMIT).await?;
    Ok(Json(DeadLetterQueueResponse { count, messages }))
}

/// Query of `POST /replay-payment`; every field is required
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReplayParams {
    /// Only `pay_currency_from_file` is supported
    pub action: Option<String>,
    /// ISO 4217 alpha code
    pub currency: Option<String>,
    /// Object key of the original UFX file
    pub file: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing query parameter: {}", name)))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReplayResponse {
    pub decoded: usize,
    #[schema(value_type = Vec<String>)]
    pub submitted: Vec<PaymentId>,
    pub failures: usize,
    pub withheld: Vec<String>,
}

/// Re-ingest one currency of an earlier batch file
#[utoipa::path(
    post,
    path = "/replay-payment",
    params(ReplayParams),
    responses(
        (status = 200, body = ReplayResponse),
        (status = 400, description = "Missing parameter, unknown action or currency", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody)
    ),
    tag = "Internal"
)]
pub async fn replay_payment(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReplayParams>,
) -> ApiResult<Json<ReplayResponse>> {
    let action = required(params.action, "action")?;
    let currency = required(params.currency, "currency")?;
    let file = required(params.file, "file")?;

    let outcome = state.replay.replay(&action, &currency, &file).await?;
    info!(
        file = %file,
        currency = %currency,
        decoded = outcome.decoded,
        submitted = outcome.submitted.len(),
        failures = outcome.failures.len(),
        "Replay finished"
    );
    Ok(Json(ReplayResponse {
        decoded: outcome.decoded,
        submitted: outcome.submitted,
        failures: outcome.failures.len(),
        withheld: outcome.withheld,
    }))
}
