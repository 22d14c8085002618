//! Startup orchestration.
//!
//! # Responsibilities
//! - Create the manager's own directories when absent
//! - Open the machine and site registries from the data directory

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::config::ManagerConfig;
use crate::registry::store::{MACHINES_FILE, SITES_FILE};
use crate::registry::{MachineStore, RegistryResult, SiteStore};

/// Create project resources, template root and data directory if missing.
///
/// Returns the directories that had to be created.
pub fn ensure_directories(config: &ManagerConfig) -> io::Result<Vec<PathBuf>> {
    let wanted = [
        config.paths.project_resources.clone(),
        config.paths.template_dir(),
        config.registry.data_dir.clone(),
    ];

    let mut created = Vec::new();
    for dir in wanted {
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            tracing::info!(path = %dir.display(), "Created directory");
            created.push(dir);
        }
    }

    for dir in [&config.paths.sites_available, &config.paths.conf_d] {
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "nginx output directory does not exist");
        }
    }

    Ok(created)
}

/// Load both registries from `registry.data_dir`.
pub fn open_registries(config: &ManagerConfig) -> RegistryResult<(MachineStore, SiteStore)> {
    let data_dir = &config.registry.data_dir;
    let machines = MachineStore::load_from_file(&data_dir.join(MACHINES_FILE))?;
    let sites = SiteStore::load_from_file(&data_dir.join(SITES_FILE))?;
    Ok((machines, sites))
}
