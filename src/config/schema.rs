//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the manager.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use crate::generate::SaveDestination;

/// Name of the template directory under the project resources root.
pub const TEMPLATE_DIR_NAME: &str = "createTemplateFiles";

/// Extension every template file must carry.
pub const TEMPLATE_EXTENSION: &str = ".txt";

/// Root configuration for the nginx manager.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ManagerConfig {
    /// Admin API listener.
    pub server: ServerConfig,

    /// Filesystem locations read and written by the manager.
    pub paths: PathsConfig,

    /// Registry storage.
    pub registry: RegistryConfig,

    /// Overrides for the current host's identity.
    pub host: HostConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub admin: AdminConfig,
}

/// Admin API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Filesystem layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root holding `createTemplateFiles/`.
    pub project_resources: PathBuf,

    /// Directory reconciled when a scan names none.
    pub scan_directory: PathBuf,

    /// Output directory for the `sites-available` destination.
    pub sites_available: PathBuf,

    /// Output directory for the `conf.d` destination.
    pub conf_d: PathBuf,
}

impl PathsConfig {
    /// Directory holding generation templates.
    pub fn template_dir(&self) -> PathBuf {
        self.project_resources.join(TEMPLATE_DIR_NAME)
    }

    /// Directory a destination writes into.
    pub fn output_dir(&self, destination: SaveDestination) -> &PathBuf {
        match destination {
            SaveDestination::SitesAvailable => &self.sites_available,
            SaveDestination::ConfD => &self.conf_d,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project_resources: PathBuf::from("/var/lib/nginx-manager/resources"),
            scan_directory: PathBuf::from("/etc/nginx/sites-available"),
            sites_available: PathBuf::from("/etc/nginx/sites-available"),
            conf_d: PathBuf::from("/etc/nginx/conf.d"),
        }
    }
}

/// Registry storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding `machines.json` and `sites.json`.
    pub data_dir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/nginx-manager/data"),
        }
    }
}

/// Current-host identity overrides. Unset fields are discovered.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    pub machine_name: Option<String>,
    pub local_ip_address: Option<Ipv4Addr>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API authentication.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
