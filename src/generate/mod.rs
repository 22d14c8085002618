//! Template-based site provisioning.
//!
//! # Data Flow
//! ```text
//! POST /nginx/create-config-file (CreateSiteRequest)
//!     → request.rs   presence, name, server names, id syntax
//!     → generator.rs machine exists, port, destination, template file,
//!                    current host registered, app host has an address,
//!                    primary server name free
//!     → render (Tera) → write <output dir>/<primary>[.conf]
//!     → SiteRegistry::create
//!     → GenerationResult { filePath, record }
//! ```
//!
//! # Design Decisions
//! - Checks run in a fixed order; the first failure is the one reported
//! - Nothing touches the filesystem until every check has passed
//! - Write before record: a failed write never leaves a record behind;
//!   a failed record after a good write leaves the file in place

pub mod generator;
pub mod request;

pub use generator::{render, GenerateError, GenerationResult, TemplateGenerator};
pub use request::{CreateSiteRequest, SaveDestination, SiteSpecification, ValidationError};
