use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::{
    Result,
    eyre::{WrapErr, eyre},
};
use spangate::{
    adapters::{AppState, HttpStorage, StaticAssets, build_router},
    config::{ConfigValidator, GatewayConfig, RawConfig},
    core::{CredentialGate, TraceServer},
    ports::Storage,
    tracing_setup,
    tunnel::TunnelBridge,
    utils::GracefulShutdown,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Base URL of the span storage service
    #[clap(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Port to listen on
    #[clap(long, env = "PORT")]
    port: Option<u16>,

    /// Host to listen on
    #[clap(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// The directory containing the UI bundle
    #[clap(short = 't', long = "assets", env = "SPANGATE_UI_DIR")]
    assets: Option<PathBuf>,

    /// Comma-separated user:pass pairs; empty disables the credential gate
    #[clap(long, env = "SPANGATE_AUTH", default_value = "", hide_env_values = true)]
    auth: String,

    /// Tunnel keepalive interval (humantime syntax, e.g. "20s")
    #[clap(long, env = "KEEPALIVE_INTERVAL", default_value = "20s")]
    keepalive: String,

    /// Log to the console instead of JSON (development)
    #[clap(long)]
    pretty_logs: bool,
}

impl Args {
    fn into_raw_config(self) -> (RawConfig, bool) {
        let pretty = self.pretty_logs;
        (
            RawConfig {
                database_url: self.database_url,
                port: self.port,
                host: self.host,
                asset_dir: self.assets,
                auth: self.auth,
                keepalive: self.keepalive,
            },
            pretty,
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (raw, pretty_logs) = Args::parse().into_raw_config();

    if pretty_logs {
        tracing_setup::init_console_tracing()?;
    } else {
        tracing_setup::init_tracing()?;
    }

    // Configuration errors are reported together, before any socket opens.
    let config = match ConfigValidator::validate(&raw) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    run(config).await
}

async fn run(config: GatewayConfig) -> Result<()> {
    // Storage liveness round-trip before anything listens.
    let storage = Arc::new(
        HttpStorage::new(config.database_url.clone())
            .wrap_err("Failed to create storage client")?,
    );
    storage
        .ping()
        .await
        .wrap_err_with(|| format!("Storage at {} failed liveness probe", config.database_url))?;
    tracing::info!(storage = %config.database_url, "storage liveness probe ok");

    let server = TraceServer::new(storage);
    let state = AppState {
        server: server.clone(),
        gate: Arc::new(CredentialGate::new(config.credentials.clone())),
        assets: StaticAssets::new(&config.asset_dir),
    };

    let (bridge, tunnel_listener) = TunnelBridge::new(config.keepalive_interval);
    let app = build_router(state, bridge.clone());

    tracing::info!("Starting tunnelled RPC server on /rpc");
    let mut rpc_task = tokio::spawn(spangate::rpc::serve(tunnel_listener, server));

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move { signal_handler_shutdown.run_signal_handler().await });

    let listen_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {listen_addr}"))?;

    tracing::info!(
        addr = %listen_addr,
        gated = !config.credentials.is_empty(),
        keepalive = ?config.keepalive_interval,
        "Starting HTTP server"
    );

    // Any serving loop failing is fatal: there is no supervision strategy
    // inside the gateway, an external process manager restarts it.
    tokio::select! {
        result = axum::serve(listener, app) => {
            result.wrap_err("HTTP server failed")?;
            Err(eyre!("HTTP server stopped unexpectedly"))
        }
        result = &mut rpc_task => {
            match result {
                Ok(Ok(())) => Err(eyre!("RPC server stopped unexpectedly")),
                Ok(Err(e)) => Err(e.wrap_err("RPC server failed")),
                Err(e) => Err(eyre!("RPC server task panicked: {e}")),
            }
        }
        reason = graceful_shutdown.wait_for_shutdown_signal() => {
            tracing::info!("Shutdown signal received: {:?}", reason);
            // Close the virtual listener before the real one so in-flight
            // RPC connections are not orphaned behind a dead bridge.
            bridge.close();
            let _ = rpc_task.await;
            tracing::info!("Graceful shutdown completed");
            Ok(())
        }
    }
}
