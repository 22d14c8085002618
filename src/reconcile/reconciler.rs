//! Directory scan and classification.

use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::nginx::{self, ParsedConfigFacts};
use crate::observability::metrics;
use crate::reconcile::report::{
    CurrentMachine, DuplicateEntry, NewEntry, ReconcileError, ReconciliationReport,
};
use crate::registry::{
    Machine, MachineDirectory, MachineId, NewSiteRecord, RegistryError, SiteRegistry,
};

/// nginx's stock site, never registered.
const DEFAULT_SITE: &str = "default";

/// Failure scoped to a single discovered file.
#[derive(Debug, Error)]
enum FileFailure {
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("no server names found")]
    NoServerNames,

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

enum Classified {
    New(NewEntry),
    Duplicate(DuplicateEntry),
}

/// Diffs a directory of site files against the site registry.
pub struct DirectoryReconciler<'a> {
    machines: &'a dyn MachineDirectory,
    sites: &'a dyn SiteRegistry,
    host_address: Ipv4Addr,
}

impl<'a> DirectoryReconciler<'a> {
    /// `host_address` identifies the machine whose disk is being scanned.
    pub fn new(
        machines: &'a dyn MachineDirectory,
        sites: &'a dyn SiteRegistry,
        host_address: Ipv4Addr,
    ) -> Self {
        Self {
            machines,
            sites,
            host_address,
        }
    }

    /// Scan `directory`, registering every file whose primary server name is new.
    pub fn reconcile(&self, directory: &Path) -> Result<ReconciliationReport, ReconcileError> {
        let host = self
            .machines
            .find_by_address(self.host_address)?
            .ok_or(ReconcileError::HostNotRegistered {
                address: self.host_address,
            })?;

        let files = list_site_files(directory)?;

        tracing::info!(
            directory = %directory.display(),
            files = files.len(),
            nginx_host = %host.id,
            "Reconciling site directory"
        );

        let mut report = ReconciliationReport::new(
            directory.to_path_buf(),
            CurrentMachine {
                id: host.id,
                machine_name: host.machine_name.clone(),
                local_ip_address: self.host_address,
            },
        );

        for (file_name, path) in files {
            report.scanned += 1;
            match self.reconcile_file(&file_name, &path, &host, directory) {
                Ok(Classified::New(entry)) => {
                    tracing::info!(file = %file_name, record_id = %entry.record_id, "New site registered");
                    metrics::record_scan_file("new");
                    report.push_new(entry);
                }
                Ok(Classified::Duplicate(entry)) => {
                    tracing::debug!(file = %file_name, reason = %entry.reason, "Duplicate site");
                    metrics::record_scan_file("duplicate");
                    report.push_duplicate(entry);
                }
                Err(e) => {
                    tracing::warn!(file = %file_name, error = %e, "Failed to reconcile site file");
                    metrics::record_scan_file("error");
                    report.push_error(file_name, e.to_string());
                }
            }
        }

        tracing::info!(
            directory = %directory.display(),
            scanned = report.scanned,
            new = report.new_count,
            duplicates = report.duplicate_count,
            errors = report.error_count,
            "Reconciliation complete"
        );
        Ok(report)
    }

    fn reconcile_file(
        &self,
        file_name: &str,
        path: &Path,
        host: &Machine,
        directory: &Path,
    ) -> Result<Classified, FileFailure> {
        let content = fs::read_to_string(path)?;
        let facts = nginx::parse(&content);

        let primary = facts
            .primary_server_name()
            .ok_or(FileFailure::NoServerNames)?
            .to_string();

        let app_host_machine_id = self.resolve_app_host(file_name, &facts);

        if let Some(existing) = self.sites.find_by_primary_name(&primary)? {
            return Ok(Classified::Duplicate(DuplicateEntry {
                file_name: file_name.to_string(),
                facts,
                existing_record_id: Some(existing.id),
                reason: duplicate_reason(&primary),
            }));
        }

        let draft = NewSiteRecord {
            server_name: primary.clone(),
            additional_server_names: facts.additional_server_names().to_vec(),
            port_number: facts.listen_port.unwrap_or(0),
            app_host_machine_id,
            nginx_host_machine_id: host.id,
            framework: facts.framework.label().to_string(),
            store_directory: directory.to_path_buf(),
        };

        match self.sites.create(draft) {
            Ok(record) => Ok(Classified::New(NewEntry {
                file_name: file_name.to_string(),
                facts,
                app_host_machine_id,
                record_id: record.id,
            })),
            // Another scan registered the same name between lookup and create.
            Err(RegistryError::DuplicateServerName(_)) => Ok(Classified::Duplicate(DuplicateEntry {
                file_name: file_name.to_string(),
                facts,
                existing_record_id: None,
                reason: duplicate_reason(&primary),
            })),
            Err(e) => Err(e.into()),
        }
    }

    fn resolve_app_host(&self, file_name: &str, facts: &ParsedConfigFacts) -> Option<MachineId> {
        let address = facts.local_ip_address?;
        match self.machines.find_by_address(address) {
            Ok(Some(machine)) => Some(machine.id),
            Ok(None) => {
                tracing::debug!(file = %file_name, address = %address, "Upstream address not registered");
                None
            }
            Err(e) => {
                tracing::warn!(file = %file_name, address = %address, error = %e, "App host lookup failed");
                None
            }
        }
    }
}

fn duplicate_reason(primary: &str) -> String {
    format!("server name {primary} is already registered")
}

/// Regular files (following symlinks) in name order, excluding `default`.
fn list_site_files(directory: &Path) -> Result<Vec<(String, PathBuf)>, ReconcileError> {
    let unreadable = |source| ReconcileError::DirectoryUnreadable {
        path: directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if file_name == DEFAULT_SITE {
            continue;
        }

        let path = entry.path();
        // Broken symlinks fall through and surface as per-file read errors.
        if fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Skipping subdirectory");
            continue;
        }
        files.push((file_name, path));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
