//! Print the default configuration.

use anyhow::Result;

pub async fn run() -> Result<()> {
    print!("{}", pulse_config::default_config_toml()?);
    Ok(())
}
