//! Route table composition.
//!
//! Precedence, highest first:
//! 1. the tunnel upgrade path (`/rpc`) - ungated, RPC authentication is an
//!    independent concern of the RPC layer;
//! 2. the ingestion endpoint (`/api/v1/spans`) - ungated so instrumented
//!    services can always ship spans;
//! 3. everything else goes to the gated sub-router: the query API plus the
//!    SPA fallback, all wrapped by the credential middleware.
//!
//! Axum resolves an exact route before the fallback, which gives the
//! "exact path beats registered prefix beats catch-all" rule the tests pin
//! down.
use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware,
    response::Response,
    routing::{any, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    adapters::{api, middleware::require_basic_auth, static_files::StaticAssets, zipkin},
    core::{auth::CredentialGate, server::TraceServer},
    tunnel::{self, TunnelBridge},
};

/// Read-only state shared by every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub server: TraceServer,
    pub gate: Arc<CredentialGate>,
    pub assets: StaticAssets,
}

async fn spa_fallback(State(state): State<AppState>, req: Request) -> Response {
    state.assets.serve(req).await
}

/// Build the full route table served on the real listener.
pub fn build_router(state: AppState, bridge: Arc<TunnelBridge>) -> Router {
    let tunnel_routes = Router::new()
        .route("/rpc", any(tunnel::upgrade_handler))
        .with_state(bridge);

    let ingest_routes = Router::new()
        .route("/api/v1/spans", post(zipkin::ingest_spans))
        .with_state(state.clone());

    let gated_routes = Router::new()
        .route("/api/traces", get(api::query_traces))
        .route("/api/traces/{id}", get(api::get_trace))
        .route("/api/services", get(api::list_services))
        .route("/api/services/{service}/operations", get(api::list_operations))
        .fallback(spa_fallback)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(tunnel_routes)
        .merge(ingest_routes)
        .merge(gated_routes)
        .layer(TraceLayer::new_for_http())
}
