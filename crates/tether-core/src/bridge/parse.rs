//! Pure parsers for device-bridge command output.
//!
//! The bridge's listings are line-oriented text. Each parser here turns
//! one listing into typed records so the probes compare structure, not
//! substrings. Lines that do not match the expected shape are skipped.

use std::net::Ipv4Addr;

/// One row of the bridge's device listing (`devices -l`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Device serial number
    pub serial: String,
    /// Connection state (`device`, `offline`, `unauthorized`, ...)
    pub state: String,
    /// Value of the `model:` attribute, if present
    pub model: Option<String>,
    /// Value of the `device:` attribute, if present
    pub device: Option<String>,
}

impl DeviceRecord {
    /// Whether the device is attached and ready for commands.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == "device"
    }
}

/// A reverse port forward: device-side `remote` routed to host-side `local`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseRule {
    /// Device-side TCP port
    pub remote: u16,
    /// Host-side TCP port
    pub local: u16,
}

impl ReverseRule {
    /// The device-side port spec as the bridge renders it.
    #[must_use]
    pub fn remote_spec(&self) -> String {
        format!("tcp:{}", self.remote)
    }

    /// The host-side port spec as the bridge renders it.
    #[must_use]
    pub fn local_spec(&self) -> String {
        format!("tcp:{}", self.local)
    }
}

/// An interface address with its broadcast address, from `ip addr` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceAddress {
    /// The interface's IPv4 address
    pub addr: Ipv4Addr,
    /// The interface's broadcast address
    pub broadcast: Ipv4Addr,
}

/// Parse `devices -l` output into typed records.
///
/// The header line, daemon chatter (`* daemon ...`) and blank lines are
/// skipped.
#[must_use]
pub fn parse_devices(output: &str) -> Vec<DeviceRecord> {
    output.lines().filter_map(parse_device_line).collect()
}

fn parse_device_line(line: &str) -> Option<DeviceRecord> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("List of devices") || line.starts_with('*') {
        return None;
    }

    let mut tokens = line.split_whitespace();
    let serial = tokens.next()?.to_string();
    let state = tokens.next()?.to_string();

    let mut model = None;
    let mut device = None;
    for token in tokens {
        if let Some(value) = token.strip_prefix("model:") {
            model = Some(value.to_string());
        } else if let Some(value) = token.strip_prefix("device:") {
            device = Some(value.to_string());
        }
    }

    Some(DeviceRecord {
        serial,
        state,
        model,
        device,
    })
}

/// Parse `reverse --list` output into typed rules.
///
/// Each row is `<host> tcp:<remote> tcp:<local>`; rows with non-TCP specs
/// or malformed ports are skipped.
#[must_use]
pub fn parse_reverse_list(output: &str) -> Vec<ReverseRule> {
    output
        .lines()
        .filter_map(|line| {
            let mut tokens = line.split_whitespace();
            let _host = tokens.next()?;
            let remote = parse_port_spec(tokens.next()?)?;
            let local = parse_port_spec(tokens.next()?)?;
            Some(ReverseRule { remote, local })
        })
        .collect()
}

fn parse_port_spec(spec: &str) -> Option<u16> {
    spec.strip_prefix("tcp:")?.parse().ok()
}

/// Parse `ip addr show <iface>` output into address/broadcast pairs.
///
/// Only `inet` lines carrying a `brd` attribute are kept; loopback-style
/// addresses without a broadcast are not interesting here.
#[must_use]
pub fn parse_interface_addresses(output: &str) -> Vec<InterfaceAddress> {
    output.lines().filter_map(parse_inet_line).collect()
}

fn parse_inet_line(line: &str) -> Option<InterfaceAddress> {
    let mut tokens = line.split_whitespace();

    tokens.find(|token| *token == "inet")?;
    let cidr = tokens.next()?;
    let addr: Ipv4Addr = cidr.split('/').next()?.parse().ok()?;

    tokens.find(|token| *token == "brd")?;
    let broadcast: Ipv4Addr = tokens.next()?.parse().ok()?;

    Some(InterfaceAddress { addr, broadcast })
}
