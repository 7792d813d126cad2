//! App restart flow.
//!
//! The desktop app caches connection state and writes preferences on
//! exit, so a clean relaunch of both apps is sometimes all that's needed.

use anyhow::Result;

use tether_core::connection::Switcher;

/// Kill and relaunch both apps without changing the connection mode.
pub async fn run(switcher: &Switcher) -> Result<()> {
    println!("Restarting the desktop and headset apps...");
    switcher.restart().await?;
    println!("Done. Both apps are running again.");
    Ok(())
}
