//! Axum middleware adapters.
//!
//! The credential gate itself is a pure predicate (`core::auth`); this layer
//! is the HTTP-shaped shell around it: decoding `Authorization: Basic` and
//! emitting the 401 challenge on denial without ever invoking the inner
//! handler.
use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};

use crate::{adapters::router::AppState, core::auth::Credential};

const CHALLENGE: &str = "Basic realm=\"spangate\"";

/// Decode a `Basic` authorization header into a presented credential.
/// Anything malformed simply counts as "no credential presented".
pub fn parse_basic_credential(value: &HeaderValue) -> Option<Credential> {
    let text = value.to_str().ok()?;
    let (scheme, encoded) = text.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, secret) = decoded.split_once(':')?;
    Some(Credential {
        username: username.to_string(),
        secret: secret.to_string(),
    })
}

/// Gate every request on the wrapped router behind the credential set.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(parse_basic_credential);

    if state.gate.allow(presented.as_ref()) {
        return next.run(req).await;
    }

    tracing::debug!(path = %req.uri().path(), "denied unauthenticated request");
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(header::WWW_AUTHENTICATE, CHALLENGE)
        .body(Body::from("Unauthorized"))
        .unwrap_or_else(|_| Response::new(Body::from("Unauthorized")))
}
