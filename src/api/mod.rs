//! HTTP API.
//!
//! Routes:
//! - `POST /urls`, `GET /urls`, `GET /urls/:id`, `POST /urls/:id/cancel`
//! - `POST /urls/start`, `POST /urls/stop`, `POST /urls/delete` (bulk, `{ "ids": [...] }`)
//! - `GET /health`, `GET /ping`

mod handlers;
pub mod types;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;

use crate::app::shutdown_signal;
use crate::error_handling::ProcessingStats;
use crate::service::AnalysisService;

/// Shared state for the handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: AnalysisService,
    pub stats: Arc<ProcessingStats>,
}

/// Builds the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .route("/urls", post(handlers::submit_url).get(handlers::list_urls))
        .route("/urls/start", post(handlers::start_urls))
        .route("/urls/stop", post(handlers::stop_urls))
        .route("/urls/delete", post(handlers::delete_urls))
        .route("/urls/:id", get(handlers::get_url))
        .route("/urls/:id/cancel", post(handlers::cancel_url))
        .with_state(state)
}

/// Serves the API on `listener` until Ctrl-C or `cancel` fires.
///
/// In-flight requests are allowed to finish.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), anyhow::Error> {
    let addr = listener.local_addr()?;
    log::info!("API listening on http://{addr}/");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await
        .map_err(|e| anyhow::anyhow!("API server error: {e}"))?;

    log::info!("API server stopped");
    Ok(())
}
