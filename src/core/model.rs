//! Domain types shared by every protocol surface.
//!
//! These types are the fixed interface to the storage engine: the gateway
//! never interprets span contents beyond what is needed to route and decode
//! them. Identifiers use the collector convention of 64-bit values rendered
//! as zero-padded lowercase hex.
use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error produced when parsing a hex-encoded identifier.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid hex id '{0}'")]
pub struct ParseIdError(String);

macro_rules! hex_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:016x}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                u64::from_str_radix(s, 16)
                    .map(Self)
                    .map_err(|_| ParseIdError(s.to_string()))
            }
        }
    };
}

hex_id!(TraceId);
hex_id!(SpanId);

/// A single span as handed to the storage collaborator. Timestamps and
/// durations are microseconds, matching the collector wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    #[serde(default)]
    pub parent_id: Option<SpanId>,
    pub service_name: String,
    pub operation_name: String,
    pub start_time_us: u64,
    pub duration_us: u64,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// A trace is the set of spans sharing one trace id, as returned by storage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub spans: Vec<RawSpan>,
}

impl Trace {
    pub fn trace_id(&self) -> Option<TraceId> {
        self.spans.first().map(|span| span.trace_id)
    }
}

/// Search parameters forwarded verbatim to the storage engine. The query
/// algorithm itself lives behind the [`Storage`](crate::ports::storage::Storage)
/// port.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceQuery {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub start_us: Option<u64>,
    #[serde(default)]
    pub finish_us: Option<u64>,
    #[serde(default)]
    pub min_duration_us: Option<u64>,
    #[serde(default)]
    pub max_duration_us: Option<u64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_id_hex_round_trip() {
        let id: TraceId = "00000000000004d2".parse().unwrap();
        assert_eq!(id, TraceId(1234));
        assert_eq!(id.to_string(), "00000000000004d2");
    }

    #[test]
    fn short_hex_is_accepted() {
        let id: SpanId = "4d2".parse().unwrap();
        assert_eq!(id, SpanId(1234));
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!("not-hex".parse::<TraceId>().is_err());
        assert!("".parse::<SpanId>().is_err());
    }

    #[test]
    fn trace_id_of_empty_trace_is_none() {
        assert_eq!(Trace::default().trace_id(), None);
    }
}
