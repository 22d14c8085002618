//! Reconciliation report and error types.

use serde::Serialize;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use thiserror::Error;

use crate::error::ErrorKind;
use crate::nginx::ParsedConfigFacts;
use crate::registry::{MachineId, RegistryError, SiteId};

/// Errors that abort a whole reconciliation run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The current host has no machine record.
    #[error("host {address} is not registered as a machine")]
    HostNotRegistered { address: Ipv4Addr },

    /// The scanned directory could not be listed.
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The machine registry failed while resolving the current host.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::HostNotRegistered { .. } | ReconcileError::DirectoryUnreadable { .. } => {
                ErrorKind::Precondition
            }
            ReconcileError::Registry(_) => ErrorKind::Internal,
        }
    }
}

/// The machine the scan ran on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMachine {
    pub id: MachineId,
    pub machine_name: String,
    pub local_ip_address: Ipv4Addr,
}

/// A file that produced a new site record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    pub file_name: String,
    #[serde(flatten)]
    pub facts: ParsedConfigFacts,
    pub app_host_machine_id: Option<MachineId>,
    pub record_id: SiteId,
}

/// A file whose primary server name was already registered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEntry {
    pub file_name: String,
    #[serde(flatten)]
    pub facts: ParsedConfigFacts,
    pub existing_record_id: Option<SiteId>,
    pub reason: String,
}

/// A file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    pub file_name: String,
    pub error: String,
}

/// Outcome of scanning one directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub directory: PathBuf,
    pub scanned: usize,
    pub new_count: usize,
    pub duplicate_count: usize,
    pub error_count: usize,
    pub new_entries: Vec<NewEntry>,
    pub duplicates: Vec<DuplicateEntry>,
    pub errors: Vec<FileError>,
    pub current_machine: CurrentMachine,
}

impl ReconciliationReport {
    pub(crate) fn new(directory: PathBuf, current_machine: CurrentMachine) -> Self {
        Self {
            directory,
            scanned: 0,
            new_count: 0,
            duplicate_count: 0,
            error_count: 0,
            new_entries: Vec::new(),
            duplicates: Vec::new(),
            errors: Vec::new(),
            current_machine,
        }
    }

    pub(crate) fn push_new(&mut self, entry: NewEntry) {
        self.new_count += 1;
        self.new_entries.push(entry);
    }

    pub(crate) fn push_duplicate(&mut self, entry: DuplicateEntry) {
        self.duplicate_count += 1;
        self.duplicates.push(entry);
    }

    pub(crate) fn push_error(&mut self, file_name: impl Into<String>, error: impl Into<String>) {
        self.error_count += 1;
        self.errors.push(FileError {
            file_name: file_name.into(),
            error: error.into(),
        });
    }
}
