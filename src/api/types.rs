//! HTTP API request and response bodies (camelCase JSON).

use serde::{Deserialize, Serialize};

use crate::storage::{AnalysisRecord, AnalysisStatus};

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub id: i64,
    pub url: String,
    pub status: AnalysisStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub urls: Vec<AnalysisRecord>,
}

/// Response to a cancellation request. `status` is the record's status after
/// the request.
#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub message: String,
    pub id: i64,
    pub status: AnalysisStatus,
}

/// Body of the bulk start/stop/delete endpoints.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// Per-identifier result of a bulk operation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItemResult {
    pub id: i64,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkResponse {
    pub results: Vec<BulkItemResult>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub db_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_error: Option<String>,
    pub active_jobs: usize,
    pub queued_jobs: usize,
    pub jobs_done: usize,
    pub jobs_errored: usize,
    pub jobs_cancelled: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
