//! Error classification shared by the reconciliation and generation paths.

use serde::Serialize;

/// Broad class of a failure, used to decide how it surfaces to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Host not registered, directory unreadable.
    Precondition,
    /// Malformed or missing request field.
    Validation,
    /// Referenced machine or template absent.
    NotFound,
    /// Record already registered under the same primary server name.
    Conflict,
    /// Rendering or writing a generated file failed.
    WriteFailure,
    /// Registry storage failure or corrupt data.
    Internal,
}
