//! The mode-switch orchestrator.
//!
//! [`Switcher::setup`] drives the four subsystems — app lifecycle,
//! preference store, reverse forwarding, packet filter — through one
//! strictly sequential sequence and verifies the end state. There is no
//! rollback: the first failure aborts the switch and propagates, leaving
//! whatever partial state exists for the operator to inspect.

use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::apps::{AppSupervisor, AppTarget};
use crate::bridge::{Bridge, ReverseRule};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::PacketFilter;
use crate::prefs::PreferenceEditor;
use crate::runner::{CommandRunner, Exec, SystemRunner};

/// Target transport for the headset link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// USB-tethered: traffic rides the reverse forward over the cable
    Usb,
    /// Plain WiFi: normal network discovery between app and headset
    Wifi,
}

impl ConnectionMode {
    /// Whether this is the USB-tethered mode.
    #[must_use]
    pub const fn is_usb(self) -> bool {
        matches!(self, Self::Usb)
    }

    /// The forced-IP value this mode writes: loopback while the reverse
    /// forward carries the traffic, empty ("unforced") for WiFi
    /// discovery.
    #[must_use]
    pub const fn forced_ip(self) -> &'static str {
        match self {
            Self::Usb => "127.0.0.1",
            Self::Wifi => "",
        }
    }
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Usb => "USB",
            Self::Wifi => "WiFi",
        })
    }
}

/// Sequences the subsystems into one connection-mode switch.
#[derive(Debug, Clone)]
pub struct Switcher {
    bridge: Bridge,
    apps: AppSupervisor,
    prefs: PreferenceEditor,
    filter: PacketFilter,
    forward: ReverseRule,
    device_model: String,
}

impl Switcher {
    /// Build a switcher running real external commands.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Build a switcher over an injected command runner.
    #[must_use]
    pub fn with_runner(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        let exec = Exec::new(runner);
        let bridge = Bridge::new(exec.clone(), &config.bridge);
        let apps = AppSupervisor::new(
            exec.clone(),
            bridge.clone(),
            config.desktop.clone(),
            config.headset.clone(),
            config.poll,
        );
        let prefs = PreferenceEditor::new(exec.clone(), apps.clone(), &config.prefs);
        let filter = PacketFilter::new(exec, &config.filter);

        Self {
            bridge,
            apps,
            prefs,
            filter,
            forward: ReverseRule {
                remote: config.forward.remote,
                local: config.forward.local,
            },
            device_model: config.headset.model.clone(),
        }
    }

    /// Switch every subsystem to `mode` and verify the end state.
    ///
    /// With `kill_first`, both apps are stopped before anything else;
    /// without it the preference edit still refuses to run while the
    /// desktop app is up.
    pub async fn setup(&self, mode: ConnectionMode, kill_first: bool) -> Result<()> {
        info!(%mode, kill_first, "switching connection mode");

        if kill_first {
            // The headset app writes its own state on exit; stop the
            // desktop first so the two shutdowns don't race.
            self.apps.stop(AppTarget::Desktop).await?;
            self.apps.stop(AppTarget::Headset).await?;
        }

        self.prefs.set_forced_ip(mode).await?;
        self.set_reverse_forward(mode).await?;
        self.filter.apply(mode).await?;

        self.apps.start(AppTarget::Desktop).await?;
        self.apps.start(AppTarget::Headset).await?;

        if mode.is_usb() {
            self.verify_forced_ip(mode).await?;
        }

        info!(%mode, "connection mode switched");
        Ok(())
    }

    /// Kill and relaunch both apps without changing the mode.
    pub async fn restart(&self) -> Result<()> {
        info!("restarting both apps");
        self.apps.stop(AppTarget::Desktop).await?;
        self.apps.stop(AppTarget::Headset).await?;
        self.apps.start(AppTarget::Desktop).await?;
        self.apps.start(AppTarget::Headset).await?;
        Ok(())
    }

    /// Converge the reverse forward on the target mode, verifying the
    /// bridge's rule table afterwards in both directions.
    async fn set_reverse_forward(&self, mode: ConnectionMode) -> Result<()> {
        if !self.bridge.is_device_connected(&self.device_model).await? {
            return Err(Error::DeviceNotConnected);
        }

        match mode {
            ConnectionMode::Usb => {
                if !self.bridge.is_reverse_enabled(self.forward).await? {
                    self.bridge.enable_reverse(self.forward).await?;
                }
                if !self.bridge.is_reverse_enabled(self.forward).await? {
                    return Err(Error::ReverseEnableFailed(self.forward.remote));
                }
                info!(port = self.forward.remote, "reverse forward enabled");
            }
            ConnectionMode::Wifi => {
                if self.bridge.is_reverse_enabled(self.forward).await? {
                    self.bridge.disable_reverse(self.forward).await?;
                }
                if self.bridge.is_reverse_enabled(self.forward).await? {
                    return Err(Error::ReverseDisableFailed(self.forward.remote));
                }
                info!(port = self.forward.remote, "reverse forward removed");
            }
        }
        Ok(())
    }

    /// Re-read the preference store and confirm the forced IP stuck.
    ///
    /// Detects the relaunched app winning the race against the edit and
    /// rewriting its preferences before the immutability lock applied.
    async fn verify_forced_ip(&self, mode: ConnectionMode) -> Result<()> {
        let found = self.prefs.forced_ip().await?;
        if found != mode.forced_ip() {
            return Err(Error::ForcedIpReverted {
                expected: mode.forced_ip().to_string(),
                found,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_ip_by_mode() {
        assert_eq!(ConnectionMode::Usb.forced_ip(), "127.0.0.1");
        assert_eq!(ConnectionMode::Wifi.forced_ip(), "");
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(ConnectionMode::Usb.to_string(), "USB");
        assert_eq!(ConnectionMode::Wifi.to_string(), "WiFi");
    }
}
