//! Connection-mode switch flow.

use anyhow::Result;

use tether_core::connection::{ConnectionMode, Switcher};

/// Run a full mode switch.
pub async fn run(switcher: &Switcher, mode: ConnectionMode, kill_first: bool) -> Result<()> {
    println!("Switching the headset link to {mode}...");
    switcher.setup(mode, kill_first).await?;
    println!("Done. The headset link is now on {mode}.");
    Ok(())
}
