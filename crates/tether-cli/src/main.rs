//! Tether CLI - USB/WiFi connection-mode switching for VR headset streaming
//!
//! Tether converges the device bridge, the desktop app's preferences, the
//! packet filter, and both app processes on one connection mode.
//!
//! ## Quick Start
//!
//! ```bash
//! # Low-latency USB tethering (kills and relaunches the apps)
//! tether --usb --restart
//!
//! # Back to plain WiFi
//! tether --wifi --restart
//! ```

#![allow(clippy::doc_markdown)]

use anyhow::Result;
use clap::Parser;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    commands::dispatch(cli).await
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_filter = if verbose {
        "debug"
    } else {
        "warn,tether=info,tether_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
