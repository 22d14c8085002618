//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Reject empty paths and credentials
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ManagerConfig → Result<(), Vec<ConfigValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::ManagerConfig;

/// A single semantic problem in a configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Dotted path of the offending key, e.g. `server.bind_address`.
    pub key: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &ManagerConfig) -> Result<(), Vec<ConfigValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "server.bind_address", &config.server.bind_address);
    if config.server.request_timeout_secs == 0 {
        errors.push(ConfigValidationError {
            key: "server.request_timeout_secs",
            message: "must be greater than zero".to_string(),
        });
    }

    check_path(&mut errors, "paths.project_resources", &config.paths.project_resources);
    check_path(&mut errors, "paths.scan_directory", &config.paths.scan_directory);
    check_path(&mut errors, "paths.sites_available", &config.paths.sites_available);
    check_path(&mut errors, "paths.conf_d", &config.paths.conf_d);
    check_path(&mut errors, "registry.data_dir", &config.registry.data_dir);

    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.admin.api_key.trim().is_empty() {
        errors.push(ConfigValidationError {
            key: "admin.api_key",
            message: "must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ConfigValidationError>, key: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ConfigValidationError {
            key,
            message: format!("\"{value}\" is not a valid socket address"),
        });
    }
}

fn check_path(errors: &mut Vec<ConfigValidationError>, key: &'static str, value: &Path) {
    if value.as_os_str().is_empty() {
        errors.push(ConfigValidationError {
            key,
            message: "must not be empty".to_string(),
        });
    }
}
