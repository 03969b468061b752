//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};

use super::super::state::AppState;
use crate::health::HealthSnapshot;

/// Health check endpoint
///
/// Serves the snapshot of the last dependency sweep; never pings anything
/// itself.
///
/// - Healthy: 200 OK
/// - Unhealthy or no sweep yet: 503 Service Unavailable
#[utoipa::path(
    get,
    path = "/health_check",
    responses(
        (status = 200, description = "All dependencies healthy", body = HealthSnapshot),
        (status = 503, description = "A dependency failed its last ping", body = HealthSnapshot)
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthSnapshot>) {
    let snapshot = state.health.snapshot().await;
    let status = if snapshot.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(snapshot))
}
