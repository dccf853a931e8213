use async_trait::async_trait;
use thiserror::Error;

use crate::core::model::{RawSpan, Trace, TraceId, TraceQuery};

/// Error type for storage operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StorageError {
    /// The requested trace does not exist
    #[error("trace not found")]
    NotFound,

    /// The storage service could not be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The storage service reported an error
    #[error("storage backend error: {0}")]
    Backend(String),

    /// The storage response could not be decoded
    #[error("failed to decode storage response: {0}")]
    Decode(String),
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage defines the port (interface) to the span storage engine.
///
/// The gateway only ever talks to storage through this trait; how spans are
/// persisted and queried is the storage engine's concern. Implementations
/// must be safe for concurrent use since the HTTP surface and the RPC
/// surface call into the same instance.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Explicit liveness round-trip, performed once at startup before any
    /// listener opens.
    async fn ping(&self) -> StorageResult<()>;

    /// Persist one span.
    async fn store_span(&self, span: RawSpan) -> StorageResult<()>;

    /// Fetch every span belonging to a trace.
    async fn trace_by_id(&self, id: TraceId) -> StorageResult<Trace>;

    /// List known service names.
    async fn services(&self) -> StorageResult<Vec<String>>;

    /// List known operation names for one service.
    async fn operations(&self, service: &str) -> StorageResult<Vec<String>>;

    /// Search traces matching a query.
    async fn query(&self, query: TraceQuery) -> StorageResult<Vec<Trace>>;
}
