//! Registry record types and error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a registered machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MachineId(pub Uuid);

impl MachineId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MachineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for MachineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Identifier of a registered site record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub Uuid);

impl SiteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SiteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A physical or virtual host known to the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: MachineId,
    pub machine_name: String,
    /// Join key between discovered upstreams and registered hosts.
    pub local_ip_address: Option<Ipv4Addr>,
    #[serde(default, rename = "urlFor404Api")]
    pub url_for_404_api: Option<String>,
    #[serde(default)]
    pub user_home_dir: Option<PathBuf>,
    /// Candidate directories for generated site files.
    #[serde(default)]
    pub nginx_storage_path_options: Vec<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Machine {
    /// Build a machine with a fresh id and current timestamps.
    pub fn new(machine_name: impl Into<String>, local_ip_address: Option<Ipv4Addr>) -> Self {
        let now = Utc::now();
        Self {
            id: MachineId::new(),
            machine_name: machine_name.into(),
            local_ip_address,
            url_for_404_api: None,
            user_home_dir: None,
            nginx_storage_path_options: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Draft of a site record, before the registry assigns identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSiteRecord {
    pub server_name: String,
    pub additional_server_names: Vec<String>,
    pub port_number: u16,
    pub app_host_machine_id: Option<MachineId>,
    pub nginx_host_machine_id: MachineId,
    pub framework: String,
    pub store_directory: PathBuf,
}

/// A registered nginx virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord {
    pub id: SiteId,
    /// Primary server name; unique across the registry.
    pub server_name: String,
    #[serde(rename = "serverNameArrayOfAdditionalServerNames", default)]
    pub additional_server_names: Vec<String>,
    /// Upstream port; zero when a discovered file had no upstream.
    pub port_number: u16,
    #[serde(rename = "appHostServerMachineId")]
    pub app_host_machine_id: Option<MachineId>,
    #[serde(rename = "nginxHostServerMachineId")]
    pub nginx_host_machine_id: MachineId,
    pub framework: String,
    pub store_directory: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SiteRecord {
    /// Materialise a draft with a fresh id and timestamps.
    pub fn from_draft(draft: NewSiteRecord) -> Self {
        let now = Utc::now();
        Self {
            id: SiteId::new(),
            server_name: draft.server_name,
            additional_server_names: draft.additional_server_names,
            port_number: draft.port_number,
            app_host_machine_id: draft.app_host_machine_id,
            nginx_host_machine_id: draft.nginx_host_machine_id,
            framework: draft.framework,
            store_directory: draft.store_directory,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Errors raised by registry stores.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A site with this primary server name is already registered.
    #[error("site already registered for server name {0}")]
    DuplicateServerName(String),

    /// A machine with this address is already registered.
    #[error("machine already registered for address {0}")]
    DuplicateAddress(Ipv4Addr),

    /// Reading or writing the backing file failed.
    #[error("registry storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file holds malformed data.
    #[error("registry serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
