pub mod api;
pub mod memory;
pub mod middleware;
pub mod router;
pub mod static_files;
pub mod storage_http;
pub mod zipkin;

/// Re-export commonly used types from adapters
pub use memory::MemoryStorage;
pub use router::{AppState, build_router};
pub use static_files::StaticAssets;
pub use storage_http::HttpStorage;
