//! HTTP surface: payment intake, lookups, reports, operator tools and health.

pub mod error;
pub mod handlers;
pub mod openapi;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::shutdown::ShutdownSignal;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/payments", post(handlers::create_payment))
        .route("/payments/{id}", get(handlers::get_payment))
        .route("/payments/report", get(handlers::get_report))
        .route("/payments/report/{date}", get(handlers::get_report_for_day))
        .route(
            "/payments/currencies-report",
            get(handlers::get_currency_report),
        )
        .route(
            "/payments/currencies-report/{date}",
            get(handlers::get_currency_report_for_day),
        )
        .route("/mid/{mid}/{date}", get(handlers::get_by_merchant))
        .route(
            "/internal/dead-letter-queues/{name}",
            get(handlers::get_dead_letter_queue),
        )
        .route("/replay-payment", post(handlers::replay_payment))
        .route("/health_check", get(handlers::health_check))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Serve until `shutdown` fires; in-flight requests are allowed to finish.
pub async fn run_server(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Gateway listening");
    info!("Swagger UI available at http://{}/docs", addr);
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: ShutdownSignal,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;
    info!("Gateway stopped");
    Ok(())
}
