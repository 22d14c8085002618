//! Machine and site registries.
//!
//! # Data Flow
//! ```text
//! reconcile / generate
//!     → MachineDirectory (resolve app host / nginx host by address or id)
//!     → SiteRegistry (dedup by primary server name, create records)
//!
//! store.rs backs both traits with concurrent maps,
//! flushed to JSON files after every mutation.
//! ```
//!
//! # Design Decisions
//! - Interfaces are traits so the core never depends on a storage engine
//! - Primary server name is the unique key for sites, enforced at `create`
//! - Machine address is unique at registration, so lookup by address never
//!   has to pick between several matches

pub mod store;
pub mod types;

use std::net::Ipv4Addr;

pub use store::{MachineStore, SiteStore};
pub use types::{
    Machine, MachineId, NewSiteRecord, RegistryError, RegistryResult, SiteId, SiteRecord,
};

/// Lookup interface over known hosts.
pub trait MachineDirectory: Send + Sync {
    /// Find the machine whose network address equals `address`.
    fn find_by_address(&self, address: Ipv4Addr) -> RegistryResult<Option<Machine>>;

    /// Find a machine by identifier.
    fn find_by_id(&self, id: &MachineId) -> RegistryResult<Option<Machine>>;
}

/// Persistence interface over registered virtual hosts.
pub trait SiteRegistry: Send + Sync {
    /// Find the record whose primary server name equals `name`.
    fn find_by_primary_name(&self, name: &str) -> RegistryResult<Option<SiteRecord>>;

    /// Persist a new record.
    ///
    /// Fails with [`RegistryError::DuplicateServerName`] when the primary
    /// server name is already taken.
    fn create(&self, record: NewSiteRecord) -> RegistryResult<SiteRecord>;

    /// All records, oldest first.
    fn list_all(&self) -> RegistryResult<Vec<SiteRecord>>;

    /// Remove every record, returning how many were removed.
    fn delete_all(&self) -> RegistryResult<usize>;
}
