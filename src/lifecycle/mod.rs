//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Create missing directories → Open registries → Bind
//!
//! Signals (signals.rs):
//!     SIGINT → Stop accepting → Drain in-flight requests → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - nginx output directories are never created; they belong to nginx

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::{ensure_directories, open_registries};
