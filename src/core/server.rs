//! The domain server object shared by all three protocol surfaces.
//!
//! One `TraceServer` instance backs the HTTP API, the ingestion endpoint and
//! the tunnelled RPC server, exactly mirroring how a single storage handle is
//! shared across transports. It holds no state of its own; the storage
//! collaborator is responsible for its own concurrency safety.
use std::sync::Arc;

use crate::{
    core::model::{RawSpan, Trace, TraceId, TraceQuery},
    ports::storage::{Storage, StorageResult},
};

/// Thin facade over the storage port, cheap to clone.
#[derive(Clone)]
pub struct TraceServer {
    storage: Arc<dyn Storage>,
}

impl TraceServer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Store one decoded span.
    pub async fn ingest(&self, span: RawSpan) -> StorageResult<()> {
        tracing::debug!(
            trace = %span.trace_id,
            span = %span.span_id,
            service = %span.service_name,
            "ingesting span"
        );
        self.storage.store_span(span).await
    }

    pub async fn trace_by_id(&self, id: TraceId) -> StorageResult<Trace> {
        self.storage.trace_by_id(id).await
    }

    pub async fn services(&self) -> StorageResult<Vec<String>> {
        self.storage.services().await
    }

    pub async fn operations(&self, service: &str) -> StorageResult<Vec<String>> {
        self.storage.operations(service).await
    }

    pub async fn query(&self, query: TraceQuery) -> StorageResult<Vec<Trace>> {
        self.storage.query(query).await
    }
}
