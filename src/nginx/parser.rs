//! Directive recognition over raw site file text.
//!
//! # Responsibilities
//! - Collect every `server_name` token across all directives
//! - Capture the first `proxy_pass http://<ipv4>:<port>;` upstream
//! - Classify the framework from the `location /static {` opener
//!
//! # Design Decisions
//! - Pattern matching, not a grammar: blocks, includes and comments are not
//!   interpreted, so a commented-out directive still matches
//! - An upstream whose address or port does not parse is treated as absent

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::net::Ipv4Addr;

use crate::nginx::types::{Framework, ParsedConfigFacts};

static SERVER_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"server_name\s+([^;]+);").expect("server_name pattern is valid")
});

static PROXY_PASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"proxy_pass\s+http://([0-9.]+):(\d+);").expect("proxy_pass pattern is valid")
});

static STATIC_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"location\s+/static\s*\{").expect("static location pattern is valid")
});

/// Extract structured facts from nginx configuration text.
pub fn parse(content: &str) -> ParsedConfigFacts {
    let (listen_port, local_ip_address) = match first_upstream(content) {
        Some((ip, port)) => (Some(port), Some(ip)),
        None => (None, None),
    };

    ParsedConfigFacts {
        server_names: server_names(content),
        listen_port,
        local_ip_address,
        framework: framework(content),
    }
}

fn server_names(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    SERVER_NAME
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .flat_map(|names| names.as_str().split_whitespace())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

fn first_upstream(content: &str) -> Option<(Ipv4Addr, u16)> {
    let caps = PROXY_PASS.captures(content)?;
    let ip = caps.get(1)?.as_str().parse::<Ipv4Addr>().ok()?;
    let port = caps.get(2)?.as_str().parse::<u16>().ok()?;
    Some((ip, port))
}

fn framework(content: &str) -> Framework {
    if STATIC_LOCATION.is_match(content) {
        Framework::NextJsPython
    } else {
        Framework::ExpressJs
    }
}
