mod common;

use std::fs;
use std::net::Ipv4Addr;

use common::{site_file, Fleet, APP_HOST_IP, NGINX_HOST_IP};
use nginx_manager::error::ErrorKind;
use nginx_manager::nginx::Framework;
use nginx_manager::reconcile::{DirectoryReconciler, ReconcileError};
use nginx_manager::registry::{SiteRegistry, SiteStore};

#[test]
fn test_new_site_is_registered() {
    let fleet = Fleet::new();
    fleet.write_site("x.com", &site_file("x.com www.x.com", "10.0.0.5:4000"));

    let reconciler = DirectoryReconciler::new(&fleet.machines, &fleet.sites, NGINX_HOST_IP);
    let report = reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap();

    assert_eq!(report.scanned, 1);
    assert_eq!(report.new_count, 1);
    assert_eq!(report.duplicate_count, 0);
    assert_eq!(report.error_count, 0);
    assert_eq!(report.current_machine.id, fleet.nginx_host.id);

    let entry = &report.new_entries[0];
    assert_eq!(entry.facts.server_names, vec!["x.com", "www.x.com"]);
    assert_eq!(entry.facts.listen_port, Some(4000));
    assert_eq!(entry.facts.local_ip_address, Some(APP_HOST_IP));
    assert_eq!(entry.app_host_machine_id, Some(fleet.app_host.id));

    let record = fleet.sites.find_by_primary_name("x.com").unwrap().unwrap();
    assert_eq!(record.id, entry.record_id);
    assert_eq!(record.additional_server_names, vec!["www.x.com"]);
    assert_eq!(record.port_number, 4000);
    assert_eq!(record.app_host_machine_id, Some(fleet.app_host.id));
    assert_eq!(record.nginx_host_machine_id, fleet.nginx_host.id);
    assert_eq!(record.framework, Framework::ExpressJs.label());
    assert_eq!(record.store_directory, fleet.config.paths.sites_available);
}

#[test]
fn test_second_run_reports_duplicates_only() {
    let fleet = Fleet::new();
    fleet.write_site("x.com", &site_file("x.com", "10.0.0.5:4000"));
    fleet.write_site("y.com", &site_file("y.com", "10.0.0.5:4001"));

    let reconciler = DirectoryReconciler::new(&fleet.machines, &fleet.sites, NGINX_HOST_IP);
    let first = reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap();
    assert_eq!(first.new_count, 2);

    let second = reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap();
    assert_eq!(second.scanned, 2);
    assert_eq!(second.new_count, 0);
    assert_eq!(second.duplicate_count, 2);
    assert_eq!(fleet.sites.list_all().unwrap().len(), 2);

    let dup = &second.duplicates[0];
    assert_eq!(dup.file_name, "x.com");
    assert_eq!(dup.existing_record_id, Some(first.new_entries[0].record_id));
    assert_eq!(dup.reason, "server name x.com is already registered");
}

#[test]
fn test_file_without_server_name_is_an_error() {
    let fleet = Fleet::new();
    fleet.write_site("broken", "server {\n    listen 80;\n}\n");
    fleet.write_site("ok.com", &site_file("ok.com", "10.0.0.5:3000"));

    let reconciler = DirectoryReconciler::new(&fleet.machines, &fleet.sites, NGINX_HOST_IP);
    let report = reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.error_count, 1);
    assert_eq!(report.errors[0].file_name, "broken");
    assert_eq!(report.errors[0].error, "no server names found");
    assert_eq!(report.new_count, 1);
    assert_eq!(fleet.sites.list_all().unwrap().len(), 1);
}

#[test]
fn test_unsaved_record_is_retried_on_next_scan() {
    let fleet = Fleet::new();
    fleet.write_site("x.com", &site_file("x.com", "10.0.0.5:4000"));
    let blocker = fleet.root.path().join("blocker");
    fs::write(&blocker, "").unwrap();
    let sites = SiteStore::new(Some(blocker.join("sites.json")));

    let reconciler = DirectoryReconciler::new(&fleet.machines, &sites, NGINX_HOST_IP);
    for _ in 0..2 {
        let report = reconciler
            .reconcile(&fleet.config.paths.sites_available)
            .unwrap();
        assert_eq!(report.new_count, 0);
        assert_eq!(report.duplicate_count, 0);
        assert_eq!(report.error_count, 1);
        assert!(report.errors[0].error.starts_with("registry error"));
    }
    assert!(sites.find_by_primary_name("x.com").unwrap().is_none());
}

#[test]
fn test_unregistered_host_aborts_before_listing() {
    let fleet = Fleet::new();
    fleet.write_site("x.com", &site_file("x.com", "10.0.0.5:4000"));

    let reconciler =
        DirectoryReconciler::new(&fleet.machines, &fleet.sites, Ipv4Addr::new(192, 168, 1, 1));
    let err = reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap_err();

    assert!(matches!(err, ReconcileError::HostNotRegistered { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(fleet.sites.list_all().unwrap().is_empty());
}

#[test]
fn test_missing_directory_is_a_precondition_failure() {
    let fleet = Fleet::new();
    let missing = fleet.root.path().join("nope");

    let reconciler = DirectoryReconciler::new(&fleet.machines, &fleet.sites, NGINX_HOST_IP);
    let err = reconciler.reconcile(&missing).unwrap_err();

    assert!(matches!(err, ReconcileError::DirectoryUnreadable { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[test]
fn test_unknown_upstream_leaves_app_host_unset() {
    let fleet = Fleet::new();
    fleet.write_site("z.com", &site_file("z.com", "172.16.0.9:5000"));

    let reconciler = DirectoryReconciler::new(&fleet.machines, &fleet.sites, NGINX_HOST_IP);
    let report = reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap();

    assert_eq!(report.new_count, 1);
    assert_eq!(report.new_entries[0].app_host_machine_id, None);
    let record = fleet.sites.find_by_primary_name("z.com").unwrap().unwrap();
    assert_eq!(record.app_host_machine_id, None);
    assert_eq!(record.port_number, 5000);
}

#[test]
fn test_static_location_sets_framework() {
    let fleet = Fleet::new();
    fleet.write_site(
        "next.com",
        "server {\n    server_name next.com;\n    location /static {\n        alias /srv/static;\n    }\n    location / {\n        proxy_pass http://10.0.0.5:3000;\n    }\n}\n",
    );

    let reconciler = DirectoryReconciler::new(&fleet.machines, &fleet.sites, NGINX_HOST_IP);
    reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap();

    let record = fleet.sites.find_by_primary_name("next.com").unwrap().unwrap();
    assert_eq!(record.framework, "Next.js / Python");
}

#[cfg(unix)]
#[test]
fn test_symlinked_site_is_followed() {
    let fleet = Fleet::new();
    let target = fleet.root.path().join("real.conf");
    fs::write(&target, site_file("linked.com", "10.0.0.5:4000")).unwrap();
    std::os::unix::fs::symlink(&target, fleet.config.paths.sites_available.join("linked.com"))
        .unwrap();

    let reconciler = DirectoryReconciler::new(&fleet.machines, &fleet.sites, NGINX_HOST_IP);
    let report = reconciler
        .reconcile(&fleet.config.paths.sites_available)
        .unwrap();

    assert_eq!(report.new_count, 1);
    assert!(fleet.sites.find_by_primary_name("linked.com").unwrap().is_some());
}
