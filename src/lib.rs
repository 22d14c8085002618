//! nginx fleet configuration manager.
//!
//! Discovers virtual-host files on disk, reconciles them against the machine
//! and site registries, and generates new site files from templates.

pub mod admin;
pub mod config;
pub mod error;
pub mod generate;
pub mod host;
pub mod http;
pub mod lifecycle;
pub mod nginx;
pub mod observability;
pub mod reconcile;
pub mod registry;

pub use config::schema::ManagerConfig;
pub use error::ErrorKind;
pub use http::HttpServer;
