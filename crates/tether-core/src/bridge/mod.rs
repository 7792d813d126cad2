//! Device bridge client.
//!
//! A thin wrapper routing subcommands through the configured bridge
//! binary (`adb`). Nothing about a device is cached: every probe
//! re-queries the bridge, so a headset unplugged between steps is seen
//! immediately instead of acting on stale state.

pub mod parse;

use std::net::Ipv4Addr;

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::runner::{Capture, Exec, Invocation};

pub use parse::{DeviceRecord, InterfaceAddress, ReverseRule};

/// Client for the device bridge binary.
#[derive(Debug, Clone)]
pub struct Bridge {
    exec: Exec,
    program: String,
}

impl Bridge {
    /// Create a bridge client over the given executor.
    #[must_use]
    pub fn new(exec: Exec, config: &BridgeConfig) -> Self {
        Self {
            exec,
            program: config.program.to_string_lossy().into_owned(),
        }
    }

    fn invocation<I, A>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Invocation::new(self.program.clone(), args)
    }

    /// List the devices currently visible to the bridge.
    pub async fn devices(&self) -> Result<Vec<DeviceRecord>> {
        let output = self
            .exec
            .run_quiet(self.invocation(["devices", "-l"]))
            .await?;
        Ok(parse::parse_devices(&output))
    }

    /// Whether a ready device with the given model name is attached.
    ///
    /// A failing device query is a propagated error, not "not connected" —
    /// a broken bridge must stop the run rather than masquerade as an
    /// unplugged headset.
    pub async fn is_device_connected(&self, model: &str) -> Result<bool> {
        let devices = self.devices().await?;
        Ok(devices
            .iter()
            .any(|record| record.is_ready() && record.model.as_deref() == Some(model)))
    }

    /// List the active reverse forwards.
    pub async fn reverse_rules(&self) -> Result<Vec<ReverseRule>> {
        let output = self
            .exec
            .run_quiet(self.invocation(["reverse", "--list"]))
            .await?;
        Ok(parse::parse_reverse_list(&output))
    }

    /// Whether the given reverse forward is currently active.
    pub async fn is_reverse_enabled(&self, rule: ReverseRule) -> Result<bool> {
        Ok(self.reverse_rules().await?.contains(&rule))
    }

    /// Install a reverse forward.
    pub async fn enable_reverse(&self, rule: ReverseRule) -> Result<()> {
        self.exec
            .run(self.invocation(["reverse".to_string(), rule.remote_spec(), rule.local_spec()]))
            .await?;
        Ok(())
    }

    /// Remove a reverse forward.
    pub async fn disable_reverse(&self, rule: ReverseRule) -> Result<()> {
        self.exec
            .run(self.invocation([
                "reverse".to_string(),
                rule.remote_spec(),
                "--remove".to_string(),
            ]))
            .await?;
        Ok(())
    }

    /// Run a shell command on the device, failing on non-zero exit.
    pub async fn shell<I, A>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let mut full = vec!["shell".to_string()];
        full.extend(args.into_iter().map(Into::into));
        self.exec.run(self.invocation(full)).await
    }

    /// Run a shell command whose exit status is the answer (`pidof` and
    /// friends): the capture is returned even on non-zero exit.
    pub async fn shell_status<I, A>(&self, args: I) -> Result<Capture>
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        let mut full = vec!["shell".to_string()];
        full.extend(args.into_iter().map(Into::into));
        self.exec.run_tolerant(self.invocation(full)).await
    }

    /// The device's WiFi address and broadcast address.
    ///
    /// The headset is assumed to have exactly one configured WiFi
    /// address; zero matches usually means the headset is asleep or WiFi
    /// is off.
    pub async fn broadcast_ip(&self) -> Result<(Ipv4Addr, Ipv4Addr)> {
        let output = self.shell(["ip", "addr", "show", "wlan0"]).await?;
        let addrs = parse::parse_interface_addresses(&output);

        match addrs.as_slice() {
            [] => Err(Error::NoBroadcastIp),
            [only] => Ok((only.addr, only.broadcast)),
            many => Err(Error::AmbiguousBroadcastIp(
                many.iter().map(|a| a.broadcast).collect(),
            )),
        }
    }
}
