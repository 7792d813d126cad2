//! Anchor-scoped packet-filter management.
//!
//! In USB mode the desktop app must not hear the headset's WiFi discovery
//! broadcasts, or it keeps answering over the slower link. A single rule
//! blocking inbound UDP to the host's broadcast address takes care of
//! that. The rule lives in a dedicated named anchor so that flushing and
//! reloading it can never disturb rules outside the anchor; the global
//! rule files are never written.

use std::net::Ipv4Addr;

use tracing::info;

use crate::config::FilterConfig;
use crate::connection::ConnectionMode;
use crate::error::{Error, Result};
use crate::net;
use crate::runner::{Exec, Invocation};

/// Manages the block rule inside the dedicated packet-filter anchor.
#[derive(Debug, Clone)]
pub struct PacketFilter {
    exec: Exec,
    anchor: String,
}

impl PacketFilter {
    /// Create a manager for the configured anchor.
    #[must_use]
    pub fn new(exec: Exec, config: &FilterConfig) -> Self {
        Self {
            exec,
            anchor: config.anchor.clone(),
        }
    }

    /// The rule text blocking inbound UDP to a broadcast address.
    #[must_use]
    pub fn block_rule(broadcast: Ipv4Addr) -> String {
        format!("block in proto udp from any to {broadcast}\n")
    }

    /// Converge the anchor on the given mode.
    ///
    /// Always flushes the anchor first, so repeated applications of
    /// either mode are idempotent. Enabling/disabling the packet filter
    /// globally is best-effort: both commands fail when the filter is
    /// already in the requested state, and that is fine.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::FilterLoad`] when the filter rejects the
    /// streamed rule, and propagates broadcast-discovery failures.
    pub async fn apply(&self, mode: ConnectionMode) -> Result<()> {
        self.flush().await?;

        if !mode.is_usb() {
            self.exec
                .run_tolerant(Invocation::new("pfctl", ["-d"]))
                .await?;
            return Ok(());
        }

        self.exec
            .run_tolerant(Invocation::new("pfctl", ["-e"]))
            .await?;

        let broadcast = net::host_broadcast_ip(&self.exec).await?;
        let rule = Self::block_rule(broadcast);
        info!(%broadcast, anchor = %self.anchor, "loading UDP block rule");

        let capture = self
            .exec
            .run_tolerant(
                Invocation::new("pfctl", ["-a", self.anchor.as_str(), "-f", "-"])
                    .with_stdin(rule),
            )
            .await?;

        if !capture.success() {
            return Err(Error::FilterLoad {
                output: capture.output,
            });
        }
        Ok(())
    }

    /// Flush every rule under the anchor. Rules outside the anchor are
    /// untouched.
    pub async fn flush(&self) -> Result<()> {
        self.exec
            .run(Invocation::new(
                "pfctl",
                ["-a", self.anchor.as_str(), "-F", "rules"],
            ))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_rule_text() {
        let rule = PacketFilter::block_rule("192.168.50.255".parse().unwrap());
        assert_eq!(rule, "block in proto udp from any to 192.168.50.255\n");
    }
}
