//! Defaults command: print the built-in configuration.

use anyhow::Context;

use trailfab_core::Config;

/// Print the default config as YAML, ready to be edited and passed back
/// with `generate --config`.
pub fn cmd_defaults() -> anyhow::Result<()> {
    let yaml = Config::default()
        .to_yaml()
        .context("Failed to serialize default config")?;
    print!("{}", yaml);
    Ok(())
}
