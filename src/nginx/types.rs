//! Facts extracted from a single nginx site file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Framework classification inferred from the config text.
///
/// This is a heuristic label, not an authoritative statement about the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Framework {
    /// Generic Node upstream.
    #[default]
    #[serde(rename = "ExpressJS")]
    ExpressJs,
    /// Upstream that also serves a `/static` location.
    #[serde(rename = "Next.js / Python")]
    NextJsPython,
}

impl Framework {
    /// The label stored in site records.
    pub fn label(&self) -> &'static str {
        match self {
            Framework::ExpressJs => "ExpressJS",
            Framework::NextJsPython => "Next.js / Python",
        }
    }
}

impl fmt::Display for Framework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of [`crate::nginx::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfigFacts {
    /// Server names in first-occurrence order, without repeats.
    pub server_names: Vec<String>,
    /// Upstream port from the first `proxy_pass`.
    pub listen_port: Option<u16>,
    /// Upstream address from the first `proxy_pass`.
    pub local_ip_address: Option<Ipv4Addr>,
    pub framework: Framework,
}

impl ParsedConfigFacts {
    /// First server name, the natural dedup key.
    pub fn primary_server_name(&self) -> Option<&str> {
        self.server_names.first().map(String::as_str)
    }

    /// Every server name after the primary one.
    pub fn additional_server_names(&self) -> &[String] {
        self.server_names.get(1..).unwrap_or(&[])
    }
}
