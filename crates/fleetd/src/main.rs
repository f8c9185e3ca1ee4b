//! fleetd — the FleetGrid daemon.
//!
//! Assembles the instance-type provider, pricing feed, and unavailability
//! tracker over a fixture directory:
//!
//! - `resolve` runs one resolution and prints it as JSON
//! - `serve` runs the background loops and the REST API
//!
//! # Usage
//!
//! ```text
//! fleetd resolve --fixtures demos/fixtures --template default
//! fleetd serve --config fleetgrid.toml --fixtures demos/fixtures --port 8080
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use fleetd::{Daemon, Fixtures, build_router};
use fleetgrid_core::{FleetConfig, Settings};

const DEFAULT_LOG_FILTER: &str = "info,fleetd=debug,fleetgrid=debug";

#[derive(Parser)]
#[command(name = "fleetd", about = "FleetGrid instance type daemon")]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one template and print the result.
    Resolve {
        /// Path to a TOML config file. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fixture directory standing in for the cloud provider.
        #[arg(long)]
        fixtures: PathBuf,

        /// Template name from templates.json.
        #[arg(long)]
        template: String,
    },
    /// Run background refresh and serve the REST API.
    Serve {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        fixtures: PathBuf,

        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Resolve {
            config,
            fixtures,
            template,
        } => run_resolve(config.as_deref(), &fixtures, &template).await,
        Command::Serve {
            config,
            fixtures,
            port,
        } => run_serve(config.as_deref(), &fixtures, port).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load(config: Option<&Path>, fixtures: &Path) -> anyhow::Result<Daemon> {
    let settings = match config {
        Some(path) => FleetConfig::from_file(path)
            .and_then(|config| config.settings())
            .with_context(|| format!("invalid config {}", path.display()))?,
        None => Settings::default(),
    };
    let fixtures = Fixtures::load(fixtures)?;
    Ok(Daemon::assemble(settings, fixtures))
}

async fn run_resolve(config: Option<&Path>, fixtures: &Path, template: &str) -> anyhow::Result<()> {
    let daemon = load(config, fixtures)?;

    let instance_types = daemon
        .resolve(template)
        .await
        .with_context(|| format!("template {template:?} not found"))??;

    println!("{}", serde_json::to_string_pretty(instance_types.as_slice())?);
    Ok(())
}

async fn run_serve(config: Option<&Path>, fixtures: &Path, port: u16) -> anyhow::Result<()> {
    info!("FleetGrid daemon starting");

    let daemon = Arc::new(load(config, fixtures)?);

    // ── Background tasks ───────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = daemon.spawn_background(&shutdown_rx);

    // ── API server ─────────────────────────────────────────────

    let router = build_router(daemon);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    for handle in handles {
        let _ = handle.await;
    }

    info!("FleetGrid daemon stopped");
    Ok(())
}
