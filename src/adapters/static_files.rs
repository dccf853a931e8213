//! Single-page-app asset handler.
//!
//! A request path containing a `.` is treated as a file reference and served
//! from the asset root; every other path gets `index.html` so client-side
//! routing keeps working after a reload. Resolution is confined to the asset
//! root: `..` segments are rejected before any file read, and the underlying
//! `ServeDir` performs its own containment checks.
use std::path::PathBuf;

use axum::{
    body::Body,
    http::{Request, StatusCode, Uri},
    response::Response,
};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

#[derive(Debug, Clone)]
pub struct StaticAssets {
    root: PathBuf,
}

impl StaticAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn serve(&self, req: Request<Body>) -> Response {
        let path = req.uri().path();

        if path.split('/').any(|segment| segment == "..") {
            tracing::warn!(%path, "rejected path traversal attempt");
            return error_response(StatusCode::BAD_REQUEST, "Invalid file path");
        }

        if path.contains('.') {
            self.serve_exact(req).await
        } else {
            self.serve_index(req).await
        }
    }

    async fn serve_exact(&self, req: Request<Body>) -> Response {
        match ServeDir::new(&self.root).oneshot(req).await {
            Ok(response) => response.map(Body::new),
            Err(e) => {
                tracing::error!(error = %e, "failed to serve static file");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }

    async fn serve_index(&self, req: Request<Body>) -> Response {
        // Rewrite to "/" so range/cache headers still apply but the path no
        // longer influences resolution.
        let (mut parts, body) = req.into_parts();
        parts.uri = Uri::from_static("/");
        let req = Request::from_parts(parts, body);

        match ServeFile::new(self.root.join("index.html")).oneshot(req).await {
            Ok(response) => response.map(Body::new),
            Err(e) => {
                tracing::error!(error = %e, "failed to serve index.html");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

fn error_response(status: StatusCode, message: &'static str) -> Response {
    Response::builder()
        .status(status)
        .body(Body::from(message))
        .unwrap_or_else(|_| Response::new(Body::from(message)))
}
