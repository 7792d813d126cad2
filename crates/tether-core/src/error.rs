//! Error types for tether.
//!
//! This module provides a unified error type for all tether operations,
//! with specific error variants for different failure modes. Every failure
//! bubbles up to the top level and terminates the run; there is no retry
//! or rollback beyond the fixed polling windows.

use std::io;
use std::net::Ipv4Addr;

use thiserror::Error;

/// A specialized `Result` type for tether operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for tether.
#[derive(Error, Debug)]
pub enum Error {
    /// An external command exited with a non-zero status
    #[error("command `{command}` exited with status {code}:\n{output}")]
    CommandFailed {
        /// The rendered command line
        command: String,
        /// The exit code (-1 when terminated by a signal)
        code: i32,
        /// Combined stdout/stderr capture
        output: String,
    },

    /// An external command could not be spawned at all
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        /// The rendered command line
        command: String,
        /// The underlying I/O error
        source: io::Error,
    },

    /// No matching headset is visible to the device bridge
    #[error("no headset connected to the device bridge")]
    DeviceNotConnected,

    /// No broadcast-capable interface was found
    #[error("no broadcast address found in the interface listing")]
    NoBroadcastIp,

    /// More than one broadcast-capable interface was found
    #[error("multiple broadcast addresses found: {0:?}")]
    AmbiguousBroadcastIp(Vec<Ipv4Addr>),

    /// An app did not reach the running state before the deadline
    #[error("the {target} app did not start within {timeout_secs} seconds")]
    StartTimeout {
        /// Which app was being started
        target: &'static str,
        /// The convergence deadline that elapsed
        timeout_secs: u64,
    },

    /// An app was still running when the stop deadline elapsed
    #[error("the {target} app did not stop within {timeout_secs} seconds")]
    StopTimeout {
        /// Which app was being stopped
        target: &'static str,
        /// The convergence deadline that elapsed
        timeout_secs: u64,
    },

    /// The reverse forward was still absent after enabling it
    #[error("failed to enable reverse forwarding on tcp:{0}")]
    ReverseEnableFailed(u16),

    /// The reverse forward was still present after removing it
    #[error("failed to remove reverse forwarding on tcp:{0}")]
    ReverseDisableFailed(u16),

    /// The preference file cannot be edited while the desktop app runs
    #[error("cannot edit preferences while the desktop app is running")]
    PreferencesInUse,

    /// The preference bundle did not have the expected shape
    #[error("malformed preference bundle: {0}")]
    BundleFormat(String),

    /// The inner preference payload was not valid JSON
    #[error("preference payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),

    /// Reading or writing the property list failed
    #[error("property list error: {0}")]
    Plist(#[from] plist::Error),

    /// The packet filter rejected the streamed block rule
    #[error("packet filter rejected the block rule:\n{output}")]
    FilterLoad {
        /// Combined output of the failed rule load
        output: String,
    },

    /// The headset's launcher activity could not be resolved
    #[error("could not resolve the launcher activity: {0}")]
    ActivityResolution(String),

    /// The relaunched app reverted the forced IP before verification
    #[error("forced IP address was reverted after relaunch (expected {expected:?}, found {found:?})")]
    ForcedIpReverted {
        /// The value the edit wrote
        expected: String,
        /// The value read back after relaunch
        found: String,
    },

    /// Configuration file error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
