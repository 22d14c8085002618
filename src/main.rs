//! nginx fleet configuration manager daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌──────────────────────────────────────────────────────┐
//!                   │                    NGINX MANAGER                      │
//!                   │                                                       │
//!   Operator / CLI  │  ┌─────────┐    ┌──────────┐    ┌─────────────────┐  │
//!   ────────────────┼─▶│  http   │───▶│  admin   │───▶│   reconcile     │──┼──▶ sites-available/
//!                   │  │ server  │    │ handlers │    │ (scan + parse)  │  │    (read)
//!                   │  └─────────┘    └────┬─────┘    └────────┬────────┘  │
//!                   │                      │                   │           │
//!                   │                      ▼                   ▼           │
//!                   │               ┌─────────────┐    ┌──────────────┐    │
//!                   │               │  generate   │───▶│   registry   │    │
//!                   │               │ (templates) │    │ machines.json│    │
//!                   │               └──────┬──────┘    │  sites.json  │    │
//!                   │                      │           └──────────────┘    │
//!                   │                      ▼                               │
//!                   │            sites-available/ or conf.d/ (write)        │
//!                   │                                                       │
//!                   │  config · host · lifecycle · observability            │
//!                   └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use nginx_manager::config::{load_config, ManagerConfig};
use nginx_manager::host::HostIdentity;
use nginx_manager::http::{AppState, HttpServer};
use nginx_manager::lifecycle::{ensure_directories, open_registries};
use nginx_manager::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "nginx-manager")]
#[command(about = "Reconciles and generates nginx site configuration", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ManagerConfig::default(),
    };

    logging::init(&config.observability);

    tracing::info!("nginx-manager v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.server.bind_address,
        scan_directory = %config.paths.scan_directory.display(),
        data_dir = %config.registry.data_dir.display(),
        "Configuration loaded"
    );

    ensure_directories(&config)?;
    let (machines, sites) = open_registries(&config)?;
    tracing::info!(
        machines = machines.count(),
        sites = sites.count(),
        "Registries opened"
    );

    let host = HostIdentity::resolve(&config.host);

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
            metrics::record_registered_sites(sites.count());
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;

    let state = AppState::new(config, host, Arc::new(machines), Arc::new(sites));
    let server = HttpServer::new(state);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
