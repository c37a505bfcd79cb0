//! HTTP request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};

use super::types::*;
use super::AppState;
use crate::error_handling::{LookupError, SubmitError};
use crate::service::CancelOutcome;
use crate::storage::AnalysisStatus;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Parses a path identifier, answering 400 when it is not a number.
fn parse_id(raw: &str) -> Result<i64, Response> {
    raw.parse::<i64>()
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "Invalid URL ID format"))
}

/// Unwraps a JSON body, answering a rejected one in the `{ "error": ... }` shape.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| error_response(rejection.status(), rejection.body_text()))
}

fn submit_error_response(e: SubmitError) -> Response {
    match e {
        SubmitError::EmptyUrl | SubmitError::InvalidUrl(_) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        SubmitError::QueueFull | SubmitError::QueueClosed => {
            warn!("Submission refused: {e}");
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        SubmitError::Database(db) => {
            error!("Failed to add URL: {db}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to add URL: {db}"),
            )
        }
    }
}

fn lookup_error_response(e: LookupError, action: &str) -> Response {
    match e {
        LookupError::NotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        LookupError::Database(db) => {
            error!("Failed to {action}: {db}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {action}: {db}"),
            )
        }
    }
}

/// `POST /urls`
pub async fn submit_url(
    State(state): State<AppState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    match state.service.submit(&request.url).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(SubmitResponse {
                message: "Url has been added".to_string(),
                id: record.id,
                url: record.url,
                status: record.status,
            }),
        )
            .into_response(),
        Err(e) => submit_error_response(e),
    }
}

/// `GET /urls`
pub async fn list_urls(State(state): State<AppState>) -> Response {
    match state.service.list().await {
        Ok(urls) => Json(ListResponse { urls }).into_response(),
        Err(e) => {
            error!("Failed to fetch urls: {e}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch urls: {e}"),
            )
        }
    }
}

/// `GET /urls/:id`
pub async fn get_url(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.get(id).await {
        Ok(record) => Json(record).into_response(),
        Err(e) => lookup_error_response(e, "fetch URL"),
    }
}

/// `POST /urls/:id/cancel`
pub async fn cancel_url(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.service.cancel(id).await {
        Ok(outcome) => Json(cancel_response(id, outcome)).into_response(),
        Err(e) => lookup_error_response(e, "cancel URL analysis"),
    }
}

fn cancel_response(id: i64, outcome: CancelOutcome) -> CancelResponse {
    match outcome {
        CancelOutcome::Cancelled { .. } => CancelResponse {
            message: "URL analysis cancelled successfully".to_string(),
            id,
            status: AnalysisStatus::Cancelled,
        },
        CancelOutcome::AlreadyTerminal(status) => CancelResponse {
            message: format!("URL analysis is already {status}. Cannot cancel."),
            id,
            status,
        },
    }
}

/// `POST /urls/start`: re-queues every listed record.
pub async fn start_urls(
    State(state): State<AppState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    let mut results = Vec::with_capacity(request.ids.len());
    for id in request.ids {
        let result = match state.service.requeue(id).await {
            Ok(Some(_)) => bulk_ok(id, "queued"),
            Ok(None) => bulk_err(id, format!("URL analysis {id} not found")),
            Err(e) => bulk_err(id, e.to_string()),
        };
        results.push(result);
    }
    Json(BulkResponse { results }).into_response()
}

/// `POST /urls/stop`: cancels every listed record.
pub async fn stop_urls(
    State(state): State<AppState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    let mut results = Vec::with_capacity(request.ids.len());
    for id in request.ids {
        let result = match state.service.cancel(id).await {
            Ok(CancelOutcome::Cancelled { .. }) => bulk_ok(id, "cancelled"),
            Ok(outcome @ CancelOutcome::AlreadyTerminal(_)) => {
                bulk_err(id, cancel_response(id, outcome).message)
            }
            Err(e) => bulk_err(id, e.to_string()),
        };
        results.push(result);
    }
    Json(BulkResponse { results }).into_response()
}

/// `POST /urls/delete`: soft-deletes every listed record.
pub async fn delete_urls(
    State(state): State<AppState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> Response {
    let request = match json_body(payload) {
        Ok(request) => request,
        Err(resp) => return resp,
    };
    let mut results = Vec::with_capacity(request.ids.len());
    for id in request.ids {
        let result = match state.service.soft_delete(id).await {
            Ok(true) => bulk_ok(id, "deleted"),
            Ok(false) => bulk_err(id, format!("URL analysis {id} not found")),
            Err(e) => bulk_err(id, e.to_string()),
        };
        results.push(result);
    }
    Json(BulkResponse { results }).into_response()
}

fn bulk_ok(id: i64, message: &str) -> BulkItemResult {
    BulkItemResult {
        id,
        success: true,
        message: message.to_string(),
    }
}

fn bulk_err(id: i64, message: String) -> BulkItemResult {
    BulkItemResult {
        id,
        success: false,
        message,
    }
}

/// `GET /health`: database ping plus job counters.
pub async fn health(State(state): State<AppState>) -> Response {
    let (jobs_done, jobs_errored, jobs_cancelled) = state.stats.job_counts();
    let ping = sqlx::query("SELECT 1").execute(state.service.pool()).await;
    let (code, status, db_status, db_error) = match ping {
        Ok(_) => (StatusCode::OK, "up", "connected", None),
        Err(e) => {
            warn!("Health check database ping failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "down",
                "unreachable",
                Some(format!("DB ping failed: {e}")),
            )
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            db_status: db_status.to_string(),
            db_error,
            active_jobs: state.service.active_jobs(),
            queued_jobs: state.service.queued_jobs(),
            jobs_done,
            jobs_errored,
            jobs_cancelled,
        }),
    )
        .into_response()
}

/// `GET /ping`
pub async fn ping() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "pong".to_string(),
    })
}
