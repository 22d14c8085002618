//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeouts)
//! - Bind server to listener and drain on shutdown

use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::ManagerConfig;
use crate::host::HostIdentity;
use crate::lifecycle::shutdown_signal;
use crate::registry::{MachineStore, SiteStore};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ManagerConfig>,
    pub host: Arc<HostIdentity>,
    pub machines: Arc<MachineStore>,
    pub sites: Arc<SiteStore>,
}

impl AppState {
    pub fn new(
        config: ManagerConfig,
        host: HostIdentity,
        machines: Arc<MachineStore>,
        sites: Arc<SiteStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            host: Arc::new(host),
            machines,
            sites,
        }
    }
}

/// HTTP server exposing the admin API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server for the given state.
    pub fn new(state: AppState) -> Self {
        let router = Self::build_router(state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.config.server.request_timeout_secs);
        setup_admin_router(state)
            .layer(TimeoutLayer::new(timeout))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
