//! # Tether Core Library
//!
//! `tether-core` switches a VR headset's streaming transport between a
//! USB-tethered link and plain WiFi by converging four independent,
//! side-effecting subsystems on one target mode:
//!
//! - **Device bridge**: reverse port forwarding through `adb`
//! - **Preference store**: the desktop app's forced-IP field inside its
//!   binary property-list preferences
//! - **Packet filter**: an anchor-scoped `pfctl` rule blocking stray
//!   UDP discovery traffic in USB mode
//! - **Process lifecycle**: stop/start of the desktop app and its
//!   on-device counterpart, observed by polling
//!
//! ## Modules
//!
//! - [`apps`] - Desktop and headset app lifecycle (start/stop/probe)
//! - [`bridge`] - Device bridge client and output parsers
//! - [`config`] - Configuration management
//! - [`connection`] - The mode-switch orchestrator
//! - [`filter`] - Anchor-scoped packet-filter management
//! - [`net`] - Host broadcast address discovery
//! - [`poll`] - Bounded poll-until-converged helper
//! - [`prefs`] - Forced-IP preference editing with immutability locking
//! - [`runner`] - External command execution
//!
//! ## Example
//!
//! ```rust,ignore
//! use tether_core::config::Config;
//! use tether_core::connection::{ConnectionMode, Switcher};
//!
//! let switcher = Switcher::new(Config::load()?);
//! switcher.setup(ConnectionMode::Usb, true).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]

pub mod apps;
pub mod bridge;
pub mod config;
pub mod connection;
pub mod error;
pub mod filter;
pub mod net;
pub mod poll;
pub mod prefs;
pub mod runner;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default device-side port of the reverse forward (the streaming port the
/// desktop app listens on).
pub const DEFAULT_FORWARD_PORT: u16 = 21000;

/// Default poll interval for process-convergence checks, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;

/// Default deadline for process start/stop convergence, in seconds.
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 10;
