//! Site provisioning request and field validation.
//!
//! # Responsibilities
//! - Accept a loosely-typed request so missing fields can be named
//! - Check each field in a fixed order, stopping at the first failure
//! - Produce a typed [`SiteSpecification`] once every check passes
//!
//! The machine-existence check sits between the id syntax check and the
//! port check; it lives in the generator because it needs the registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::registry::MachineId;

pub const FIELD_TEMPLATE_FILE_NAME: &str = "templateFileName";
pub const FIELD_SERVER_NAMES: &str = "serverNames";
pub const FIELD_APP_HOST: &str = "appHostServerMachineId";
pub const FIELD_PORT_NUMBER: &str = "portNumber";
pub const FIELD_SAVE_DESTINATION: &str = "saveDestination";

/// Characters that would break out of a `server_name` directive or a file name.
const FORBIDDEN_NAME_CHARS: &[char] = &[';', '{', '}', '/', '\\', '#', '"', '\''];

/// A request field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fields absent or empty, in declaration order.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A present field holds an unacceptable value.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    /// The first field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingFields(fields) => fields.first().copied().unwrap_or(""),
            ValidationError::InvalidField { field, .. } => *field,
        }
    }
}

/// Where a generated file is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaveDestination {
    #[serde(rename = "sites-available")]
    SitesAvailable,
    #[serde(rename = "conf.d")]
    ConfD,
}

impl SaveDestination {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveDestination::SitesAvailable => "sites-available",
            SaveDestination::ConfD => "conf.d",
        }
    }

    /// Output file name for a site whose primary server name is `primary`.
    ///
    /// nginx only includes `*.conf` from `conf.d`.
    pub fn file_name(&self, primary: &str) -> String {
        match self {
            SaveDestination::SitesAvailable => primary.to_string(),
            SaveDestination::ConfD => format!("{primary}.conf"),
        }
    }
}

impl fmt::Display for SaveDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveDestination {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sites-available" => Ok(SaveDestination::SitesAvailable),
            "conf.d" => Ok(SaveDestination::ConfD),
            other => Err(ValidationError::invalid(
                FIELD_SAVE_DESTINATION,
                format!("must be \"sites-available\" or \"conf.d\", got \"{other}\""),
            )),
        }
    }
}

/// Request payload for provisioning a new site.
///
/// Fields are kept as raw JSON so that a value of the wrong type is reported
/// by the check that owns the field, in order, instead of failing the whole
/// body at deserialisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSiteRequest {
    pub template_file_name: Option<Value>,
    pub server_names: Option<Value>,
    #[serde(rename = "appHostServerMachineId")]
    pub app_host_machine_id: Option<Value>,
    pub port_number: Option<Value>,
    pub save_destination: Option<Value>,
}

/// Request fields after the presence check.
#[derive(Debug)]
pub(crate) struct PresentFields<'r> {
    pub template_file_name: &'r Value,
    pub server_names: &'r Value,
    pub app_host_machine_id: &'r Value,
    pub port_number: &'r Value,
    pub save_destination: &'r Value,
}

impl CreateSiteRequest {
    /// Presence check, naming every missing field.
    ///
    /// Absent, `null`, `false`, blank strings and zero count as missing; an
    /// empty `serverNames` list does not (it fails the server name check
    /// instead).
    pub(crate) fn present_fields(&self) -> Result<PresentFields<'_>, ValidationError> {
        let slots = [
            (FIELD_TEMPLATE_FILE_NAME, self.template_file_name.as_ref()),
            (FIELD_SERVER_NAMES, self.server_names.as_ref()),
            (FIELD_APP_HOST, self.app_host_machine_id.as_ref()),
            (FIELD_PORT_NUMBER, self.port_number.as_ref()),
            (FIELD_SAVE_DESTINATION, self.save_destination.as_ref()),
        ];
        let missing: Vec<&'static str> = slots
            .iter()
            .filter(|(_, value)| is_missing(*value))
            .map(|(field, _)| *field)
            .collect();

        match slots {
            [(_, Some(template)), (_, Some(names)), (_, Some(app_host)), (_, Some(port)), (_, Some(destination))]
                if missing.is_empty() =>
            {
                Ok(PresentFields {
                    template_file_name: template,
                    server_names: names,
                    app_host_machine_id: app_host,
                    port_number: port,
                    save_destination: destination,
                })
            }
            _ => Err(ValidationError::MissingFields(missing)),
        }
    }
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::Bool(true)) | Some(Value::Array(_)) | Some(Value::Object(_)) => false,
    }
}

fn expect_str<'v>(field: &'static str, value: &'v Value) -> Result<&'v str, ValidationError> {
    value
        .as_str()
        .map(str::trim)
        .ok_or_else(|| ValidationError::invalid(field, "must be a string"))
}

/// A plain file name inside the template root.
pub(crate) fn validate_template_file_name(value: &Value) -> Result<String, ValidationError> {
    let name = expect_str(FIELD_TEMPLATE_FILE_NAME, value)?;
    if name.is_empty() {
        return Err(ValidationError::invalid(FIELD_TEMPLATE_FILE_NAME, "must not be empty"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(ValidationError::invalid(
            FIELD_TEMPLATE_FILE_NAME,
            "must be a file name, not a path",
        ));
    }
    Ok(name.to_string())
}

/// At least one name, each non-empty and safe to place in a directive.
pub(crate) fn validate_server_names(value: &Value) -> Result<Vec<String>, ValidationError> {
    let names = value
        .as_array()
        .ok_or_else(|| ValidationError::invalid(FIELD_SERVER_NAMES, "must be an array of strings"))?;
    if names.is_empty() {
        return Err(ValidationError::invalid(
            FIELD_SERVER_NAMES,
            "must contain at least one server name",
        ));
    }

    names
        .iter()
        .map(|raw| {
            let name = raw.as_str().map(str::trim).ok_or_else(|| {
                ValidationError::invalid(FIELD_SERVER_NAMES, "server names must be strings")
            })?;
            if name.is_empty() {
                return Err(ValidationError::invalid(
                    FIELD_SERVER_NAMES,
                    "server names must be non-empty strings",
                ));
            }
            if name == "." || name == ".."
                || name.chars().any(|c| c.is_whitespace() || FORBIDDEN_NAME_CHARS.contains(&c))
            {
                return Err(ValidationError::invalid(
                    FIELD_SERVER_NAMES,
                    format!("\"{name}\" is not a valid server name"),
                ));
            }
            Ok(name.to_string())
        })
        .collect()
}

pub(crate) fn validate_machine_id(value: &Value) -> Result<MachineId, ValidationError> {
    let raw = expect_str(FIELD_APP_HOST, value)?;
    raw.parse::<MachineId>().map_err(|_| {
        ValidationError::invalid(FIELD_APP_HOST, format!("\"{raw}\" is not a valid machine id"))
    })
}

pub(crate) fn validate_port(value: &Value) -> Result<u16, ValidationError> {
    let port = value
        .as_i64()
        .ok_or_else(|| ValidationError::invalid(FIELD_PORT_NUMBER, "must be an integer"))?;
    u16::try_from(port)
        .ok()
        .filter(|p| *p >= 1)
        .ok_or_else(|| {
            ValidationError::invalid(FIELD_PORT_NUMBER, format!("{port} is outside 1-65535"))
        })
}

pub(crate) fn validate_save_destination(value: &Value) -> Result<SaveDestination, ValidationError> {
    expect_str(FIELD_SAVE_DESTINATION, value)?.parse()
}

/// A fully validated provisioning request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSpecification {
    pub template_file_name: String,
    /// Non-empty; the first entry is the primary server name.
    pub server_names: Vec<String>,
    pub app_host_machine_id: MachineId,
    pub port_number: u16,
    pub save_destination: SaveDestination,
}

impl SiteSpecification {
    pub fn primary_server_name(&self) -> &str {
        self.server_names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn additional_server_names(&self) -> &[String] {
        self.server_names.get(1..).unwrap_or(&[])
    }
}
