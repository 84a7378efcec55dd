//! Config file commands.

use crate::config::{self, Config};
use crate::error::ResultExt;

/// Write the effective settings to the config file
pub fn cmd_config_init(config: &Config, force: bool) -> anyhow::Result<()> {
    if let Some(path) = config::config_path().filter(|p| p.exists() && !force) {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let path = config::save(config).with_context("Could not write config")?;
    println!("Wrote {}", path.display());
    if config.catalog.client_secret.is_some() {
        println!("client_secret is not written to the file; keep it in TRACKLIST_CLIENT_SECRET");
    }
    Ok(())
}

/// Print where the config file lives
pub fn cmd_config_path() -> anyhow::Result<()> {
    match config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("No config directory available on this system"),
    }
    Ok(())
}
