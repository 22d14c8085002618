//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, timeout and trace layers)
//!     → admin router (bearer auth, handlers)
//!     → reconcile / generate / registry (on the blocking pool)
//!     → JSON response
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
