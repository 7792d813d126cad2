//! Configuration management for tether.
//!
//! This module handles loading, saving, and managing tether configuration.
//! Every host-specific location the tool touches (bridge binary, app
//! bundle, preference file, anchor name, ports, poll windows) lives here
//! rather than in module constants, so one config file describes the whole
//! deployment.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS | `~/Library/Application Support/com.tether.Tether/config.toml` |
//! | Linux | `~/.config/tether/config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use tether_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("Bridge binary: {}", config.bridge.program.display());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Main configuration struct for tether.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device bridge settings
    pub bridge: BridgeConfig,
    /// Desktop app settings
    pub desktop: DesktopConfig,
    /// Headset app settings
    pub headset: HeadsetConfig,
    /// Reverse port forwarding settings
    pub forward: ForwardConfig,
    /// Preference store settings
    pub prefs: PrefsConfig,
    /// Packet filter settings
    pub filter: FilterConfig,
    /// Process convergence polling settings
    pub poll: PollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            desktop: DesktopConfig::default(),
            headset: HeadsetConfig::default(),
            forward: ForwardConfig::default(),
            prefs: PrefsConfig::default(),
            filter: FilterConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

/// Device bridge configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Path to the bridge binary (`adb`); bare names resolve via PATH
    pub program: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("adb"),
        }
    }
}

/// Desktop app configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopConfig {
    /// Application bundle opened to launch the app
    pub bundle: PathBuf,
    /// Executable path inside the bundle, used for process probes and
    /// termination (`pgrep -f` / `pkill -f`)
    pub executable: String,
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            bundle: PathBuf::from("/Applications/Immersed.app"),
            executable: "/Applications/Immersed.app/Contents/MacOS/Immersed".to_string(),
        }
    }
}

/// Headset app configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadsetConfig {
    /// Package name of the on-device app
    pub package: String,
    /// Device model name reported by the bridge's device listing
    pub model: String,
}

impl Default for HeadsetConfig {
    fn default() -> Self {
        Self {
            package: "Immersed.quest".to_string(),
            model: "Quest_Pro".to_string(),
        }
    }
}

/// Reverse port forwarding configuration options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Device-side TCP port the forward listens on
    pub remote: u16,
    /// Host-side TCP port the forward connects to
    pub local: u16,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            remote: crate::DEFAULT_FORWARD_PORT,
            local: crate::DEFAULT_FORWARD_PORT,
        }
    }
}

/// Preference store configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefsConfig {
    /// Path to the desktop app's binary preference file; a leading `~` is
    /// expanded to the user's home directory
    pub path: PathBuf,
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("~/Library/Preferences/team.Immersed.plist"),
        }
    }
}

impl PrefsConfig {
    /// Return the preference file path with a leading `~` expanded.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

/// Packet filter configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Name of the dedicated anchor holding the UDP block rule
    pub anchor: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            anchor: "tetherblock".to_string(),
        }
    }
}

/// Process convergence polling configuration options.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval between convergence probes
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Deadline for start/stop convergence
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(crate::DEFAULT_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(crate::DEFAULT_POLL_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be
    /// read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| crate::error::Error::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| crate::error::Error::Config(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::error::Error::Config(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::Error::Config(format!("Failed to serialize config: {e}")))?;

        std::fs::write(&path, content)
            .map_err(|e| crate::error::Error::Config(format!("Failed to write config: {e}")))
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "tether", "Tether")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }
}

/// Expand a leading `~` component to the user's home directory.
fn expand_home(path: &std::path::Path) -> PathBuf {
    let Ok(stripped) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    directories::BaseDirs::new()
        .map_or_else(|| path.to_path_buf(), |dirs| dirs.home_dir().join(stripped))
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.strip_suffix('s')
            .map(|secs| {
                secs.parse()
                    .map(Duration::from_secs)
                    .map_err(serde::de::Error::custom)
            })
            .or_else(|| {
                s.strip_suffix('m').map(|mins| {
                    mins.parse::<u64>()
                        .map(|m| Duration::from_secs(m * 60))
                        .map_err(serde::de::Error::custom)
                })
            })
            .unwrap_or_else(|| Err(serde::de::Error::custom("invalid duration format")))
    }
}
