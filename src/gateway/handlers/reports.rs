//! Reporting endpoints. Days are execution days; no date means today (UTC).

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};

use super::super::error::{ApiResult, ErrorBody};
use super::super::state::AppState;
use super::parse_day;
use crate::payment::PaymentInstruction;
use crate::store::{CurrencyReport, Report};

/// Today's status report
#[utoipa::path(
    get,
    path = "/payments/report",
    responses((status = 200, body = Report)),
    tag = "Reports"
)]
pub async fn get_report(State(state): State<Arc<AppState>>) -> ApiResult<Json<Report>> {
    Ok(Json(state.reporting.report(None).await?))
}

/// Status report for one day; an empty day is an empty report
#[utoipa::path(
    get,
    path = "/payments/report/{date}",
    params(("date" = String, Path, description = "Execution day, YYYY-MM-DD")),
    responses(
        (status = 200, body = Report),
        (status = 400, description = "Invalid date", body = ErrorBody)
    ),
    tag = "Reports"
)]
pub async fn get_report_for_day(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> ApiResult<Json<Report>> {
    let day = parse_day(&date)?;
    Ok(Json(state.reporting.report(Some(day)).await?))
}

#[utoipa::path(
    get,
    path = "/payments/currencies-report",
    responses((status = 200, body = CurrencyReport)),
    tag = "Reports"
)]
pub async fn get_currency_report(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CurrencyReport>> {
    Ok(Json(state.reporting.currency_report(None).await?))
}

#[utoipa::path(
    get,
    path = "/payments/currencies-report/{date}",
    params(("date" = String, Path, description = "Execution day, YYYY-MM-DD")),
    responses(
        (status = 200, body = CurrencyReport),
        (status = 400, description = "Invalid date", body = ErrorBody)
    ),
    tag = "Reports"
)]
pub async fn get_currency_report_for_day(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> ApiResult<Json<CurrencyReport>> {
    let day = parse_day(&date)?;
    Ok(Json(state.reporting.currency_report(Some(day)).await?))
}

/// Latest instruction of a merchant on an execution day
#[utoipa::path(
    get,
    path = "/mid/{mid}/{date}",
    params(
        ("mid" = String, Path, description = "Merchant contract number"),
        ("date" = String, Path, description = "Execution day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "PaymentInstruction JSON"),
        (status = 404, description = "No instruction for the merchant that day", body = ErrorBody)
    ),
    tag = "Reports"
)]
pub async fn get_by_merchant(
    State(state): State<Arc<AppState>>,
    Path((mid, date)): Path<(String, String)>,
) -> ApiResult<Json<PaymentInstruction>> {
    let day = parse_day(&date)?;
    Ok(Json(state.reporting.by_merchant(&mid, day).await?))
}
