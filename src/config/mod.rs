mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default config locations, searched in order
const DEFAULT_PATHS: [&str; 3] = [
    "./streamforged.toml",
    "~/.config/streamforged/config.toml",
    "/etc/streamforged/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.reader.max_payload_size == 0 {
        anyhow::bail!("reader.max_payload_size cannot be 0");
    }

    if config.output.record_limit == Some(0) {
        tracing::warn!("output.record_limit is 0, record listings will be empty");
    }

    Ok(())
}
