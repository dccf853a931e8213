//! Configuration data structures for the gateway.
//!
//! Configuration is environment-sourced and validated exactly once at
//! startup; after that [`GatewayConfig`] is immutable and shared read-only
//! across every concurrent handler.
use std::{path::PathBuf, time::Duration};

use url::Url;

use crate::core::auth::CredentialSet;

/// Default tunnel keepalive interval, humantime syntax.
pub const DEFAULT_KEEPALIVE: &str = "20s";

/// Raw, unvalidated settings as collected from flags and the environment.
#[derive(Debug, Clone)]
pub struct RawConfig {
    /// `DATABASE_URL` - base URL of the span storage service
    pub database_url: Option<String>,
    /// `PORT` - TCP port to listen on
    pub port: Option<u16>,
    /// `HOST` - interface to listen on
    pub host: String,
    /// `-t/--assets` - directory containing the UI bundle
    pub asset_dir: Option<PathBuf>,
    /// `SPANGATE_AUTH` - comma-separated `user:pass` pairs, empty disables the gate
    pub auth: String,
    /// `KEEPALIVE_INTERVAL` - tunnel keepalive interval (humantime)
    pub keepalive: String,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            port: None,
            host: "0.0.0.0".to_string(),
            asset_dir: None,
            auth: String::new(),
            keepalive: DEFAULT_KEEPALIVE.to_string(),
        }
    }
}

/// Validated gateway configuration, immutable after startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub database_url: Url,
    pub host: String,
    pub port: u16,
    pub asset_dir: PathBuf,
    pub credentials: CredentialSet,
    pub keepalive_interval: Duration,
}

impl GatewayConfig {
    /// The `host:port` string handed to the TCP listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
