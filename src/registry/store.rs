//! JSON-file backed registry stores.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::observability::metrics;
use crate::registry::types::{
    Machine, MachineId, NewSiteRecord, RegistryError, RegistryResult, SiteRecord,
};
use crate::registry::{MachineDirectory, SiteRegistry};

/// File name of the machine registry inside the data directory.
pub const MACHINES_FILE: &str = "machines.json";

/// File name of the site registry inside the data directory.
pub const SITES_FILE: &str = "sites.json";

/// Thread-safe registry of known machines.
#[derive(Clone, Default)]
pub struct MachineStore {
    inner: Arc<DashMap<MachineId, Machine>>,
    by_address: Arc<DashMap<Ipv4Addr, MachineId>>,
    persistence_path: Option<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl MachineStore {
    /// Create an empty store, optionally persisted at `persistence_path`.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Default::default()
        }
    }

    /// Load from file if it exists, otherwise start empty.
    pub fn load_from_file(path: &Path) -> RegistryResult<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        let machines: Vec<Machine> = read_json(path)?.unwrap_or_default();

        for machine in machines {
            if let Some(address) = machine.local_ip_address {
                if let Some(existing) = store.by_address.get(&address) {
                    tracing::warn!(
                        address = %address,
                        kept = %existing.value(),
                        skipped = %machine.id,
                        "Duplicate machine address in registry file"
                    );
                    continue;
                }
                store.by_address.insert(address, machine.id);
            }
            store.inner.insert(machine.id, machine);
        }

        tracing::info!(count = store.inner.len(), path = ?path, "Loaded machine registry");
        Ok(store)
    }

    /// Register a machine.
    ///
    /// A second machine claiming an already registered address is rejected.
    pub fn register(&self, machine: Machine) -> RegistryResult<Machine> {
        if let Some(address) = machine.local_ip_address {
            match self.by_address.entry(address) {
                Entry::Occupied(_) => return Err(RegistryError::DuplicateAddress(address)),
                Entry::Vacant(slot) => {
                    slot.insert(machine.id);
                }
            }
        }
        self.inner.insert(machine.id, machine.clone());
        if let Err(e) = self.save_to_file() {
            self.inner.remove(&machine.id);
            if let Some(address) = machine.local_ip_address {
                self.by_address.remove(&address);
            }
            return Err(e);
        }

        tracing::info!(
            machine_id = %machine.id,
            machine_name = %machine.machine_name,
            "Machine registered"
        );
        Ok(machine)
    }

    /// All machines, oldest first.
    pub fn list(&self) -> Vec<Machine> {
        let mut machines: Vec<Machine> = self.inner.iter().map(|r| r.value().clone()).collect();
        machines.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.machine_name.cmp(&b.machine_name))
        });
        machines
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    /// Save to file.
    pub fn save_to_file(&self) -> RegistryResult<()> {
        if let Some(path) = &self.persistence_path {
            let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            write_json(path, &self.list())?;
        }
        Ok(())
    }
}

impl MachineDirectory for MachineStore {
    fn find_by_address(&self, address: Ipv4Addr) -> RegistryResult<Option<Machine>> {
        let id = match self.by_address.get(&address) {
            Some(r) => *r.value(),
            None => return Ok(None),
        };
        Ok(self.inner.get(&id).map(|r| r.value().clone()))
    }

    fn find_by_id(&self, id: &MachineId) -> RegistryResult<Option<Machine>> {
        Ok(self.inner.get(id).map(|r| r.value().clone()))
    }
}

/// Thread-safe registry of site records keyed by primary server name.
#[derive(Clone, Default)]
pub struct SiteStore {
    inner: Arc<DashMap<String, SiteRecord>>,
    persistence_path: Option<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl SiteStore {
    /// Create an empty store, optionally persisted at `persistence_path`.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            persistence_path,
            ..Default::default()
        }
    }

    /// Load from file if it exists, otherwise start empty.
    pub fn load_from_file(path: &Path) -> RegistryResult<Self> {
        let store = Self::new(Some(path.to_path_buf()));
        let records: Vec<SiteRecord> = read_json(path)?.unwrap_or_default();

        for record in records {
            if store.inner.contains_key(&record.server_name) {
                tracing::warn!(
                    server_name = %record.server_name,
                    "Duplicate site record in registry file"
                );
                continue;
            }
            store.inner.insert(record.server_name.clone(), record);
        }

        metrics::record_registered_sites(store.inner.len());
        tracing::info!(count = store.inner.len(), path = ?path, "Loaded site registry");
        Ok(store)
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    fn sorted(&self) -> Vec<SiteRecord> {
        let mut records: Vec<SiteRecord> = self.inner.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.server_name.cmp(&b.server_name))
        });
        records
    }

    /// Save to file.
    pub fn save_to_file(&self) -> RegistryResult<()> {
        if let Some(path) = &self.persistence_path {
            let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
            write_json(path, &self.sorted())?;
        }
        Ok(())
    }
}

impl SiteRegistry for SiteStore {
    fn find_by_primary_name(&self, name: &str) -> RegistryResult<Option<SiteRecord>> {
        Ok(self.inner.get(name).map(|r| r.value().clone()))
    }

    fn create(&self, draft: NewSiteRecord) -> RegistryResult<SiteRecord> {
        let record = SiteRecord::from_draft(draft);
        // The shard guard must be released before saving iterates the map.
        match self.inner.entry(record.server_name.clone()) {
            Entry::Occupied(_) => {
                return Err(RegistryError::DuplicateServerName(record.server_name));
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }

        if let Err(e) = self.save_to_file() {
            self.inner.remove(&record.server_name);
            return Err(e);
        }
        metrics::record_registered_sites(self.inner.len());
        Ok(record)
    }

    fn list_all(&self) -> RegistryResult<Vec<SiteRecord>> {
        Ok(self.sorted())
    }

    fn delete_all(&self) -> RegistryResult<usize> {
        let removed = self.sorted();
        let count = removed.len();
        self.inner.clear();
        if let Err(e) = self.save_to_file() {
            for record in removed {
                self.inner.insert(record.server_name.clone(), record);
            }
            return Err(e);
        }
        metrics::record_registered_sites(0);
        tracing::info!(deleted = count, "Site registry cleared");
        Ok(count)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> RegistryResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(Some(serde_json::from_reader(reader)?))
}

/// Write through a sibling temp file so readers never see a half-written file.
fn write_json<T: Serialize>(path: &Path, value: &T) -> RegistryResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
