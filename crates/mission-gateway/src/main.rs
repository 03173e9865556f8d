//! mission-gateway binary: parse configuration, bind, serve until signalled.

use clap::Parser;
use mission_gateway::config::{GatewayConfig, MOUNT_PREFIX};
use mission_gateway::server::GatewayServer;
use std::path::PathBuf;
use tracing::{error, info};

/// mission-gateway — reverse proxy for the Mission Control dashboard
#[derive(Parser, Debug)]
#[command(name = "mission-gateway", version, about = "Mission Control dashboard proxy")]
struct Cli {
    /// Listen port
    #[arg(short, long, env = "MISSION_LISTEN_PORT", default_value_t = 18790)]
    port: u16,

    /// Upstream gateway host
    #[arg(long, env = "MISSION_UPSTREAM_HOST", default_value = "127.0.0.1")]
    upstream_host: String,

    /// Upstream gateway port
    #[arg(long, env = "MISSION_UPSTREAM_PORT", default_value_t = 18789)]
    upstream_port: u16,

    /// Directory holding the built dashboard bundle
    #[arg(long, env = "MISSION_BUNDLE_DIR", default_value = "dist")]
    bundle_dir: PathBuf,

    /// Access token gating the dashboard route (unset = open)
    #[arg(long, env = "MISSION_AUTH_TOKEN")]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    use tracing_subscriber::EnvFilter;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cli.port,
        "starting mission-gateway"
    );

    let config = match GatewayConfig::new(
        cli.port,
        cli.upstream_host,
        cli.upstream_port,
        cli.bundle_dir,
        cli.token,
    ) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    info!(prefix = MOUNT_PREFIX, "dashboard routes served from bundle");
    info!(upstream = %config.upstream_addr(), "all other traffic forwarded");

    let server = match GatewayServer::bind(config).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to bind listener");
            std::process::exit(1);
        }
    };

    // Run until shutdown signal
    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("received shutdown signal");
        }
    }

    info!("mission-gateway stopped");
}

/// Wait for SIGTERM or SIGINT (Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
