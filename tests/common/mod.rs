//! Shared fixtures for integration testing.

#![allow(dead_code)]

use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use nginx_manager::config::ManagerConfig;
use nginx_manager::registry::{Machine, MachineStore, SiteStore};
use tempfile::TempDir;

pub const NGINX_HOST_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
pub const APP_HOST_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);
pub const API_KEY: &str = "test-admin-key";

/// Template shipped with most fixtures.
pub const EXPRESS_TEMPLATE: &str = "\
server {
    listen 80;
    server_name {{ server_names }};

    location / {
        proxy_pass http://{{ local_ip_address }}:{{ port }};
        proxy_set_header Host $host;
    }
}
";

/// A throwaway fleet: config pointing into a temp dir, two registered
/// machines and an empty site registry.
pub struct Fleet {
    pub root: TempDir,
    pub config: ManagerConfig,
    pub machines: MachineStore,
    pub sites: SiteStore,
    pub nginx_host: Machine,
    pub app_host: Machine,
}

impl Fleet {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();

        let mut config = ManagerConfig::default();
        config.paths.project_resources = root.path().join("resources");
        config.paths.sites_available = root.path().join("sites-available");
        config.paths.scan_directory = config.paths.sites_available.clone();
        config.paths.conf_d = root.path().join("conf.d");
        config.registry.data_dir = root.path().join("data");
        config.host.local_ip_address = Some(NGINX_HOST_IP);
        config.admin.api_key = API_KEY.to_string();

        for dir in [
            config.paths.template_dir(),
            config.paths.sites_available.clone(),
            config.paths.conf_d.clone(),
            config.registry.data_dir.clone(),
        ] {
            fs::create_dir_all(dir).unwrap();
        }

        let machines = MachineStore::new(None);
        let nginx_host = machines
            .register(Machine::new("nginx-01", Some(NGINX_HOST_IP)))
            .unwrap();
        let app_host = machines
            .register(Machine::new("app-01", Some(APP_HOST_IP)))
            .unwrap();

        Self {
            root,
            config,
            machines,
            sites: SiteStore::new(None),
            nginx_host,
            app_host,
        }
    }

    pub fn with_template(self, name: &str, content: &str) -> Self {
        fs::write(self.config.paths.template_dir().join(name), content).unwrap();
        self
    }

    pub fn write_site(&self, name: &str, content: &str) -> PathBuf {
        let path = self.config.paths.sites_available.join(name);
        fs::write(&path, content).unwrap();
        path
    }
}

/// A minimal proxied site file.
pub fn site_file(names: &str, upstream: &str) -> String {
    format!(
        "server {{\n    listen 80;\n    server_name {names};\n    location / {{\n        proxy_pass http://{upstream};\n    }}\n}}\n"
    )
}
