//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::error::ErrorBody;
use crate::gateway::handlers::{CreatedResponse, DeadLetterQueueResponse, ReplayResponse};
use crate::health::{DependencyStatus, HealthSnapshot};
use crate::queue::QueueMessage;
use crate::store::{CurrencyReport, CurrencySummary, Report};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Settlements Processor API",
        version = "0.1.0",
        description = "Payment instruction intake, lookups, daily reports and operator tools for the settlements processor."
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::create_payment,
        crate::gateway::handlers::get_payment,
        crate::gateway::handlers::get_report,
        crate::gateway::handlers::get_report_for_day,
        crate::gateway::handlers::get_currency_report,
        crate::gateway::handlers::get_currency_report_for_day,
        crate::gateway::handlers::get_by_merchant,
        crate::gateway::handlers::get_dead_letter_queue,
        crate::gateway::handlers::replay_payment,
        crate::gateway::handlers::health_check,
    ),
    components(
        schemas(
            CreatedResponse,
            ErrorBody,
            Report,
            CurrencyReport,
            CurrencySummary,
            DeadLetterQueueResponse,
            QueueMessage,
            ReplayResponse,
            HealthSnapshot,
            DependencyStatus,
        )
    ),
    tags(
        (name = "Payments", description = "Payment instruction intake and lookup"),
        (name = "Reports", description = "Daily reports by execution date"),
        (name = "Internal", description = "Operator tools"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
