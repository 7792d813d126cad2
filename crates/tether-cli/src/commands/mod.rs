//! CLI flag definitions and dispatch.

use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use tracing::debug;

use tether_core::config::Config;
use tether_core::connection::{ConnectionMode, Switcher};

pub mod restart;
pub mod switch;

/// Tether - USB/WiFi connection-mode switcher for VR headset streaming
#[derive(Parser)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Switch to the USB-tethered connection
    #[arg(short, long, conflicts_with = "wifi")]
    pub usb: bool,

    /// Switch to the WiFi connection, undoing everything --usb sets up
    #[arg(short, long)]
    pub wifi: bool,

    /// Kill both apps before switching; alone, relaunch them without
    /// changing the mode
    #[arg(short, long)]
    pub restart: bool,

    /// Watch for headset plug/unplug and switch automatically
    /// (not implemented)
    #[arg(short, long)]
    pub monitor: bool,

    /// Detailed logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Load configuration with graceful fallback to defaults.
///
/// If the config file doesn't exist or can't be parsed, the stock
/// deployment values are used.
pub fn load_config() -> Config {
    Config::load().unwrap_or_default()
}

/// Route the parsed flags to the right flow.
pub async fn dispatch(cli: Cli) -> Result<()> {
    if cli.monitor {
        bail!("monitor mode is not implemented");
    }

    let config = load_config();
    debug!(usb = cli.usb, wifi = cli.wifi, restart = cli.restart, "dispatching");
    let switcher = Switcher::new(&config);

    match (cli.usb, cli.wifi) {
        (false, false) if cli.restart => restart::run(&switcher).await,
        (true, false) => switch::run(&switcher, ConnectionMode::Usb, cli.restart).await,
        (false, true) => switch::run(&switcher, ConnectionMode::Wifi, cli.restart).await,
        // --usb --wifi is already rejected by clap; this is the
        // no-flags-at-all case.
        _ => Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "exactly one of --usb or --wifi is required (or --restart alone)",
            )
            .exit(),
    }
}
