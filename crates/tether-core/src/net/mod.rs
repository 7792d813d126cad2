//! Host broadcast address discovery.
//!
//! The packet-filter block rule targets the host's broadcast address,
//! discovered from the local interface listing. The host is assumed to
//! have exactly one active broadcast-capable interface; anything else is
//! reported rather than guessed at.

use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::runner::{Exec, Invocation};

/// Discover the host's single broadcast address from `ifconfig` output.
///
/// # Errors
///
/// Fails with [`Error::NoBroadcastIp`] when no interface advertises a
/// broadcast address, and [`Error::AmbiguousBroadcastIp`] when more than
/// one does.
pub async fn host_broadcast_ip(exec: &Exec) -> Result<Ipv4Addr> {
    let output = exec
        .run_quiet(Invocation::new("ifconfig", Vec::<String>::new()))
        .await?;
    single_broadcast(&parse_broadcast_addresses(&output))
}

/// Extract every `broadcast <ipv4>` value from an interface listing.
#[must_use]
pub fn parse_broadcast_addresses(output: &str) -> Vec<Ipv4Addr> {
    let mut found = Vec::new();
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "broadcast" {
                if let Some(addr) = tokens.next().and_then(|t| t.parse().ok()) {
                    found.push(addr);
                }
            }
        }
    }
    found
}

fn single_broadcast(addrs: &[Ipv4Addr]) -> Result<Ipv4Addr> {
    match addrs {
        [] => Err(Error::NoBroadcastIp),
        [only] => Ok(*only),
        many => Err(Error::AmbiguousBroadcastIp(many.to_vec())),
    }
}
