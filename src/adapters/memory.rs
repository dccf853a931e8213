use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    core::model::{RawSpan, Trace, TraceId, TraceQuery},
    ports::storage::{Storage, StorageError, StorageResult},
};

/// In-memory storage adapter used by tests and local demos. Not intended for
/// production; spans live only for the process lifetime.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    spans: RwLock<Vec<RawSpan>>,
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn store_span(&self, span: RawSpan) -> StorageResult<()> {
        self.spans.write().await.push(span);
        Ok(())
    }

    async fn trace_by_id(&self, id: TraceId) -> StorageResult<Trace> {
        let spans: Vec<RawSpan> = self
            .spans
            .read()
            .await
            .iter()
            .filter(|span| span.trace_id == id)
            .cloned()
            .collect();
        if spans.is_empty() {
            return Err(StorageError::NotFound);
        }
        Ok(Trace { spans })
    }

    async fn services(&self) -> StorageResult<Vec<String>> {
        let names: BTreeSet<String> = self
            .spans
            .read()
            .await
            .iter()
            .map(|span| span.service_name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn operations(&self, service: &str) -> StorageResult<Vec<String>> {
        let names: BTreeSet<String> = self
            .spans
            .read()
            .await
            .iter()
            .filter(|span| span.service_name == service)
            .map(|span| span.operation_name.clone())
            .collect();
        Ok(names.into_iter().collect())
    }

    async fn query(&self, query: TraceQuery) -> StorageResult<Vec<Trace>> {
        let spans = self.spans.read().await;
        let mut by_trace: HashMap<TraceId, Vec<RawSpan>> = HashMap::new();
        for span in spans.iter() {
            if let Some(service) = &query.service
                && span.service_name != *service
            {
                continue;
            }
            if let Some(operation) = &query.operation
                && span.operation_name != *operation
            {
                continue;
            }
            if let Some(start) = query.start_us
                && span.start_time_us < start
            {
                continue;
            }
            if let Some(finish) = query.finish_us
                && span.start_time_us > finish
            {
                continue;
            }
            if let Some(min) = query.min_duration_us
                && span.duration_us < min
            {
                continue;
            }
            if let Some(max) = query.max_duration_us
                && span.duration_us > max
            {
                continue;
            }
            by_trace.entry(span.trace_id).or_default().push(span.clone());
        }

        let mut traces: Vec<Trace> = by_trace.into_values().map(|spans| Trace { spans }).collect();
        traces.sort_by_key(|trace| trace.spans.iter().map(|s| s.start_time_us).min());
        if let Some(limit) = query.limit {
            traces.truncate(limit);
        }
        Ok(traces)
    }
}
