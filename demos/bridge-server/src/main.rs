//! Serves the sample users/tasks catalog until Ctrl-C.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_kernel::{BridgeServer, WireBridge};
use bridge_store::{DataStore, sample_registry};
use bridge_telemetry::tracing_support;
use clap::Parser;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(about = "Serve the sample tool catalog over HTTP")]
struct Args {
    /// JSON configuration file; `TOOLBRIDGE_*` variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bind host, overriding configuration.
    #[arg(long)]
    host: Option<IpAddr>,

    /// Bind port, overriding configuration.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_support::init(tracing_support::DEFAULT_DIRECTIVE);
    let args = Args::parse();

    let mut config = bridge_config::loader::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.server = config.server.with_host(host);
    }
    if let Some(port) = args.port {
        config.server = config.server.with_port(port);
    }

    let store = Arc::new(DataStore::sample());
    let registry = sample_registry(&store).context("failed to register sample catalog")?;
    info!(
        tools = registry.tools().len(),
        resources = registry.resources().len(),
        "catalog registered"
    );

    let bridge = WireBridge::from_config(Arc::new(registry), &config.server);
    let server = BridgeServer::bind(config.server.socket_addr(), bridge)?;
    info!(addr = %server.local_addr(), name = config.server.name(), "starting server");

    server
        .serve_with_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = %err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            info!("shutdown requested");
        })
        .await?;
    Ok(())
}
