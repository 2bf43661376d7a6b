//! Rotator configuration loading.
//!
//! One TOML file holds every section (see
//! [`rotator_common::rotator::config`]). Loading always validates; a config
//! that parses but fails validation is rejected as a whole.

use std::path::Path;

use rotator_common::config::{ConfigError, ConfigLoader};
use rotator_common::rotator::config::RotatorConfig;

/// Load and validate the configuration at `path`.
pub fn load_config(path: &Path) -> Result<RotatorConfig, ConfigError> {
    let config = RotatorConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<RotatorConfig, ConfigError> {
    let config = RotatorConfig::from_toml(content)?;
    config.validate()?;
    Ok(config)
}

/// Where the effective configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Loaded from the config file.
    File,
    /// The file was missing; built-in defaults apply.
    Defaults,
}

/// Like [`load_config`], but a missing file yields the defaults.
///
/// Nothing is logged here: the caller reports [`ConfigSource::Defaults`]
/// once logging is up, since the log level itself comes from the config.
pub fn load_config_or_default(
    path: &Path,
) -> Result<(RotatorConfig, ConfigSource), ConfigError> {
    match load_config(path) {
        Ok(config) => Ok((config, ConfigSource::File)),
        Err(ConfigError::FileNotFound) => Ok((RotatorConfig::default(), ConfigSource::Defaults)),
        Err(e) => Err(e),
    }
}

/// Render a configuration as TOML.
pub fn render_config(config: &RotatorConfig) -> Result<String, ConfigError> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))
}

// ─── Tests ──────────────────────────────────────────────────────────
