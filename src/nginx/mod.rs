//! nginx virtual-host text interpretation.
//!
//! # Data Flow
//! ```text
//! raw site file text
//!     → parser.rs (server_name / proxy_pass / static-block recognition)
//!     → ParsedConfigFacts (transient, never persisted)
//!     → reconcile (discovery path)
//! ```
//!
//! # Design Decisions
//! - Only `server_name`, the first `proxy_pass http://<ip>:<port>;` and the
//!   `location /static {` opener are recognised; everything else is ignored
//! - Parsing is total: missing patterns yield empty fields, never errors
//! - No I/O; callers read files themselves

pub mod parser;
pub mod types;

pub use parser::parse;
pub use types::{Framework, ParsedConfigFacts};
