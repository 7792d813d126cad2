//! Desktop and headset app lifecycle.
//!
//! Neither platform offers a completion event for app launch or exit, so
//! both transitions are convergence loops: issue the platform command,
//! then sample the existence probe once per interval until the deadline.
//! No process handle is ever retained; every check is a fresh probe.

use std::fmt;

use tracing::info;

use crate::bridge::Bridge;
use crate::config::{DesktopConfig, HeadsetConfig, PollConfig};
use crate::error::{Error, Result};
use crate::poll;
use crate::runner::{Exec, Invocation};

/// Which application a lifecycle operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTarget {
    /// The desktop streaming client on the host
    Desktop,
    /// The client running on the headset
    Headset,
}

impl AppTarget {
    /// Short label used in errors and log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Headset => "headset",
        }
    }
}

impl fmt::Display for AppTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Starts, stops, and probes the two managed applications.
#[derive(Debug, Clone)]
pub struct AppSupervisor {
    exec: Exec,
    bridge: Bridge,
    desktop: DesktopConfig,
    headset: HeadsetConfig,
    poll: PollConfig,
}

impl AppSupervisor {
    /// Create a supervisor over the given executor and bridge.
    #[must_use]
    pub fn new(
        exec: Exec,
        bridge: Bridge,
        desktop: DesktopConfig,
        headset: HeadsetConfig,
        poll: PollConfig,
    ) -> Self {
        Self {
            exec,
            bridge,
            desktop,
            headset,
            poll,
        }
    }

    /// Whether the target app currently has a live process.
    ///
    /// The probes (`pgrep -f`, `pidof`) report absence through their exit
    /// status, so a non-zero exit here means "not running"; only a failure
    /// to run the probe at all is an error.
    pub async fn is_running(&self, target: AppTarget) -> Result<bool> {
        let capture = match target {
            AppTarget::Desktop => {
                self.exec
                    .run_tolerant(Invocation::new(
                        "pgrep",
                        ["-f", self.desktop.executable.as_str()],
                    ))
                    .await?
            }
            AppTarget::Headset => {
                self.bridge
                    .shell_status(["pidof", self.headset.package.as_str()])
                    .await?
            }
        };
        Ok(capture.success())
    }

    /// Launch the target app and wait for it to come up.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::StartTimeout`] when the app is still not
    /// running at the poll deadline.
    pub async fn start(&self, target: AppTarget) -> Result<()> {
        info!(%target, "starting app");
        self.launch(target).await?;

        let running = poll::until(self.poll.interval, self.poll.timeout, || {
            self.is_running(target)
        })
        .await?;

        if running {
            info!(%target, "app is running");
            Ok(())
        } else {
            Err(Error::StartTimeout {
                target: target.label(),
                timeout_secs: self.poll.timeout.as_secs(),
            })
        }
    }

    /// Gracefully stop the target app and wait for it to exit.
    ///
    /// A no-op when the app is already stopped: no terminate command is
    /// issued and no polling happens.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::StopTimeout`] when the app is still running at
    /// the poll deadline.
    pub async fn stop(&self, target: AppTarget) -> Result<()> {
        if !self.is_running(target).await? {
            return Ok(());
        }

        info!(%target, "stopping app");
        self.terminate(target).await?;

        let stopped = poll::until(self.poll.interval, self.poll.timeout, || async move {
            Ok(!self.is_running(target).await?)
        })
        .await?;

        if stopped {
            info!(%target, "app has exited");
            Ok(())
        } else {
            Err(Error::StopTimeout {
                target: target.label(),
                timeout_secs: self.poll.timeout.as_secs(),
            })
        }
    }

    async fn launch(&self, target: AppTarget) -> Result<()> {
        match target {
            AppTarget::Desktop => {
                let bundle = self.desktop.bundle.to_string_lossy().into_owned();
                self.exec
                    .run(Invocation::new("open", ["-n".to_string(), bundle]))
                    .await?;
            }
            AppTarget::Headset => {
                let activity = self.resolve_launcher_activity().await?;
                self.bridge
                    .shell(["am".to_string(), "start".to_string(), "-n".to_string(), activity])
                    .await?;
            }
        }
        Ok(())
    }

    async fn terminate(&self, target: AppTarget) -> Result<()> {
        match target {
            AppTarget::Desktop => {
                self.exec
                    .run(Invocation::new(
                        "pkill",
                        ["-f", self.desktop.executable.as_str()],
                    ))
                    .await?;
            }
            AppTarget::Headset => {
                self.bridge
                    .shell(["am", "force-stop", self.headset.package.as_str()])
                    .await?;
            }
        }
        Ok(())
    }

    /// Resolve the headset app's launcher activity.
    ///
    /// The resolver may print warnings before the result, so the activity
    /// is the last non-empty output line.
    async fn resolve_launcher_activity(&self) -> Result<String> {
        let output = self
            .bridge
            .shell([
                "cmd",
                "package",
                "resolve-activity",
                "--brief",
                "-c",
                "android.intent.category.LAUNCHER",
                self.headset.package.as_str(),
            ])
            .await?;

        let activity = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .next_back()
            .ok_or_else(|| Error::ActivityResolution("empty resolver output".to_string()))?;

        if !activity.contains('/') {
            return Err(Error::ActivityResolution(format!(
                "unexpected resolver output: {activity}"
            )));
        }

        Ok(activity.to_string())
    }
}
