//! Ingestion surface: Zipkin v1 JSON span collector binding.
//!
//! `POST /api/v1/spans` accepts the collector wire format used by existing
//! instrumentation. This endpoint is deliberately never gated: tracers ship
//! spans without human credentials. A malformed payload is a 400 for that
//! caller only and never affects other requests.
use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    adapters::router::AppState,
    core::model::{RawSpan, SpanId, TraceId},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ZipkinDecodeError {
    #[error("invalid hex id '{0}'")]
    InvalidId(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinSpan {
    trace_id: String,
    id: String,
    #[serde(default)]
    parent_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    timestamp: Option<u64>,
    #[serde(default)]
    duration: Option<u64>,
    #[serde(default)]
    annotations: Vec<ZipkinAnnotation>,
    #[serde(default)]
    binary_annotations: Vec<ZipkinBinaryAnnotation>,
}

#[derive(Debug, Deserialize)]
struct ZipkinAnnotation {
    timestamp: u64,
    #[allow(dead_code)]
    value: String,
    #[serde(default)]
    endpoint: Option<ZipkinEndpoint>,
}

#[derive(Debug, Deserialize)]
struct ZipkinBinaryAnnotation {
    key: String,
    value: serde_json::Value,
    #[serde(default)]
    endpoint: Option<ZipkinEndpoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZipkinEndpoint {
    #[serde(default)]
    service_name: String,
}

fn parse_hex_id(raw: &str) -> Result<u64, ZipkinDecodeError> {
    // v1 trace ids may be 128-bit; keep the low 64 bits as storage does.
    // `get` instead of indexing: a multibyte id must come back as an error,
    // not split a character.
    let low = if raw.len() > 16 {
        raw.get(raw.len() - 16..)
            .ok_or_else(|| ZipkinDecodeError::InvalidId(raw.to_string()))?
    } else {
        raw
    };
    u64::from_str_radix(low, 16).map_err(|_| ZipkinDecodeError::InvalidId(raw.to_string()))
}

impl ZipkinSpan {
    /// Convert to the storage representation. The service name is taken from
    /// the first endpoint seen in annotations; the start timestamp falls back
    /// to the earliest annotation when absent.
    pub fn into_raw_span(self) -> Result<RawSpan, ZipkinDecodeError> {
        let trace_id = TraceId(parse_hex_id(&self.trace_id)?);
        let span_id = SpanId(parse_hex_id(&self.id)?);
        let parent_id = self
            .parent_id
            .as_deref()
            .map(|raw| parse_hex_id(raw).map(SpanId))
            .transpose()?;

        let service_name = self
            .annotations
            .iter()
            .filter_map(|a| a.endpoint.as_ref())
            .chain(self.binary_annotations.iter().filter_map(|a| a.endpoint.as_ref()))
            .map(|endpoint| endpoint.service_name.clone())
            .find(|name| !name.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let start_time_us = self
            .timestamp
            .or_else(|| self.annotations.iter().map(|a| a.timestamp).min())
            .unwrap_or(0);

        let mut tags = HashMap::new();
        for annotation in self.binary_annotations {
            let value = match annotation.value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            tags.insert(annotation.key, value);
        }

        Ok(RawSpan {
            trace_id,
            span_id,
            parent_id,
            service_name,
            operation_name: self.name,
            start_time_us,
            duration_us: self.duration.unwrap_or(0),
            tags,
        })
    }
}

/// `POST /api/v1/spans`
pub async fn ingest_spans(
    State(state): State<AppState>,
    Json(spans): Json<Vec<ZipkinSpan>>,
) -> Response {
    let count = spans.len();
    for span in spans {
        let raw = match span.into_raw_span() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = %e, "rejected malformed span batch");
                return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
            }
        };
        if let Err(e) = state.server.ingest(raw).await {
            tracing::error!(error = %e, "failed to store ingested span");
            return (StatusCode::INTERNAL_SERVER_ERROR, "storage error").into_response();
        }
    }
    tracing::debug!(count, "ingested span batch");
    StatusCode::ACCEPTED.into_response()
}
