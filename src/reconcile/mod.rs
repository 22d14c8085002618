//! Filesystem-to-registry reconciliation.
//!
//! # Data Flow
//! ```text
//! POST /nginx/scan (or CLI)
//!     → reconciler.rs
//!         resolve current host (MachineDirectory)      fatal if absent
//!         list directory                               fatal if unreadable
//!         per file: read → nginx::parse → classify
//!             no server names          → errors
//!             primary name registered  → duplicates
//!             otherwise                → SiteRegistry::create → new
//!     → report.rs (ReconciliationReport)
//! ```
//!
//! # Design Decisions
//! - One bad file never aborts the scan; failures are collected per file
//! - Idempotence rests on primary server name uniqueness: a second scan of
//!   an unchanged directory reports every earlier "new" file as a duplicate
//! - Deletions on disk are not reconciled

pub mod reconciler;
pub mod report;

pub use reconciler::DirectoryReconciler;
pub use report::{
    CurrentMachine, DuplicateEntry, FileError, NewEntry, ReconcileError, ReconciliationReport,
};
