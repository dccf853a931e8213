//! Wire messages for the tunnelled RPC surface.
//!
//! Requests and responses are serde_json documents carried in
//! length-delimited frames (u32 big-endian prefix). Per-request storage
//! failures travel back as [`RpcResponse::Error`]; they never terminate the
//! connection.
use serde::{Deserialize, Serialize};

use crate::core::model::{Trace, TraceId, TraceQuery};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RpcRequest {
    /// Liveness probe, answered with `Pong`.
    Ping,
    TraceById { id: TraceId },
    Services,
    Operations { service: String },
    Query { query: TraceQuery },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "snake_case")]
pub enum RpcResponse {
    Pong,
    Trace { trace: Trace },
    Services { services: Vec<String> },
    Operations { operations: Vec<String> },
    Traces { traces: Vec<Trace> },
    Error { message: String },
}
