//! Authenticated API surface: the domain server's HTTP binding.
//!
//! Every handler here sits behind the credential gate (see
//! [`router`](crate::adapters::router)). Storage failures are mapped to a
//! status code for that caller only; nothing here can take the process down.
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    adapters::router::AppState,
    core::model::{TraceId, TraceQuery},
    ports::storage::StorageError,
};

fn status_for(error: &StorageError) -> StatusCode {
    match error {
        StorageError::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

fn storage_error_response(error: StorageError) -> Response {
    let status = status_for(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "storage request failed");
    }
    (status, error.to_string()).into_response()
}

/// `GET /api/traces/{id}`
pub async fn get_trace(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let id: TraceId = match id.parse() {
        Ok(id) => id,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    match state.server.trace_by_id(id).await {
        Ok(trace) => Json(trace).into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// Query string accepted by `GET /api/traces`.
#[derive(Debug, Default, Deserialize)]
pub struct TraceQueryParams {
    pub service: Option<String>,
    pub operation: Option<String>,
    pub start_us: Option<u64>,
    pub finish_us: Option<u64>,
    pub min_duration_us: Option<u64>,
    pub max_duration_us: Option<u64>,
    pub limit: Option<usize>,
}

impl From<TraceQueryParams> for TraceQuery {
    fn from(params: TraceQueryParams) -> Self {
        TraceQuery {
            service: params.service,
            operation: params.operation,
            start_us: params.start_us,
            finish_us: params.finish_us,
            min_duration_us: params.min_duration_us,
            max_duration_us: params.max_duration_us,
            limit: params.limit,
        }
    }
}

/// `GET /api/traces?service=...&operation=...&limit=...`
pub async fn query_traces(
    State(state): State<AppState>,
    Query(params): Query<TraceQueryParams>,
) -> Response {
    match state.server.query(params.into()).await {
        Ok(traces) => Json(traces).into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// `GET /api/services`
pub async fn list_services(State(state): State<AppState>) -> Response {
    match state.server.services().await {
        Ok(services) => Json(services).into_response(),
        Err(e) => storage_error_response(e),
    }
}

/// `GET /api/services/{service}/operations`
pub async fn list_operations(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> Response {
    match state.server.operations(&service).await {
        Ok(operations) => Json(operations).into_response(),
        Err(e) => storage_error_response(e),
    }
}
