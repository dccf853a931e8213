//! spangate - the single-port front door of a distributed-tracing backend.
//!
//! One TCP listener, three protocol surfaces:
//! - the browser-facing UI and query API (optionally behind a Basic-auth
//!   credential gate),
//! - a Zipkin-compatible span ingestion endpoint (never gated),
//! - an RPC surface tunnelled over a WebSocket upgrade so it does not need a
//!   second port.
//!
//! # Architecture
//! The crate keeps **ports** (traits) separate from **adapters**
//! (implementations), with protocol-independent logic in `core`. The two
//! pieces that make single-port multiplexing work are:
//! - [`tunnel`]: adapts message-framed, HTTP-upgraded sessions into
//!   byte-stream connections and exposes them through a virtual listener;
//! - [`rpc`]: a generic accept loop that serves remote procedures from any
//!   listener-shaped source, here the virtual one.
//!
//! # Quick Example
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use spangate::{
//!     adapters::{AppState, MemoryStorage, StaticAssets, build_router},
//!     core::{CredentialGate, CredentialSet, TraceServer},
//!     tunnel::TunnelBridge,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let server = TraceServer::new(Arc::new(MemoryStorage::default()));
//! let state = AppState {
//!     server: server.clone(),
//!     gate: Arc::new(CredentialGate::new(CredentialSet::parse("alice:secret"))),
//!     assets: StaticAssets::new("./ui"),
//! };
//! let (bridge, listener) = TunnelBridge::new(Duration::from_secs(20));
//! tokio::spawn(spangate::rpc::serve(listener, server));
//! let app = build_router(state, bridge);
//! # let _ = app; Ok(()) }
//! ```
//!
//! # Error Handling
//! Fallible APIs return `eyre::Result<T>` or a domain specific error type.
//! Per-request failures stay with their request; only startup and
//! listener-level failures terminate the process.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;
pub mod rpc;
pub mod tunnel;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{AppState, HttpStorage, StaticAssets, build_router},
    config::{ConfigValidator, GatewayConfig, RawConfig},
    core::{CredentialGate, TraceServer},
    tunnel::{TunnelBridge, TunnelListener},
    utils::GracefulShutdown,
};
