//! Identity of the machine this process runs on.
//!
//! # Responsibilities
//! - Report the hostname and the first non-loopback IPv4 address
//! - Honour operator overrides from configuration
//!
//! # Design Decisions
//! - The address is what the routing table would use for outbound traffic;
//!   a connected UDP socket reveals it without sending anything
//! - Falls back to 127.0.0.1 when no route exists

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use crate::config::HostConfig;

/// Probe target used only to select an outbound interface.
const ROUTE_PROBE: &str = "192.0.2.1:9";

/// Name and address of the current host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostIdentity {
    pub machine_name: String,
    pub local_ip_address: Ipv4Addr,
}

impl HostIdentity {
    pub fn new(machine_name: impl Into<String>, local_ip_address: Ipv4Addr) -> Self {
        Self {
            machine_name: machine_name.into(),
            local_ip_address,
        }
    }

    /// Resolve the identity, preferring configured values over discovery.
    pub fn resolve(config: &HostConfig) -> Self {
        let machine_name = config
            .machine_name
            .clone()
            .unwrap_or_else(discover_hostname);
        let local_ip_address = config.local_ip_address.unwrap_or_else(discover_ipv4);

        tracing::info!(
            machine_name = %machine_name,
            local_ip_address = %local_ip_address,
            "Host identity resolved"
        );
        Self::new(machine_name, local_ip_address)
    }
}

/// Hostname from the OS, falling back to `localhost`.
pub fn discover_hostname() -> String {
    fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| "localhost".to_string())
}

/// First non-loopback IPv4 address, falling back to `127.0.0.1`.
pub fn discover_ipv4() -> Ipv4Addr {
    match outbound_ipv4() {
        Some(ip) => ip,
        None => {
            tracing::warn!("No external IPv4 address found, using loopback");
            Ipv4Addr::LOCALHOST
        }
    }
}

fn outbound_ipv4() -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(ROUTE_PROBE).ok()?;
    match socket.local_addr().ok()? {
        SocketAddr::V4(addr) if !addr.ip().is_loopback() && !addr.ip().is_unspecified() => {
            Some(*addr.ip())
        }
        _ => None,
    }
}
