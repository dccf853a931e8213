//! Subscriber wiring for the gateway's structured logs.
//!
//! Production output is JSON lines; `--pretty-logs` switches to a
//! human-readable console layer during development. The filter comes from
//! `RUST_LOG` and defaults to `info`.
use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the JSON subscriber used in production.
pub fn init_tracing() -> Result<()> {
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(false)
        .with_span_list(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    Registry::default().with(default_filter()).with(json_layer).init();
    tracing::debug!("json log output initialized");
    Ok(())
}

/// Install a console subscriber for development runs.
pub fn init_console_tracing() -> Result<()> {
    let console_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    Registry::default()
        .with(default_filter())
        .with(console_layer)
        .init();
    tracing::debug!("console log output initialized");
    Ok(())
}

/// Install a subscriber with an explicit filter directive, for embedders
/// that manage `RUST_LOG` themselves.
pub fn init_tracing_with_filter(directive: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .wrap_err_with(|| format!("Invalid log filter directive: {directive}"))?;

    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        Registry::default().with(filter).with(layer.json()).init();
    } else {
        Registry::default().with(filter).with(layer.pretty()).init();
    }
    Ok(())
}
