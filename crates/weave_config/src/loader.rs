//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::WeaveConfig;
use std::path::Path;

/// The configuration file name looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "weave.toml";

/// Loads `<dir>/weave.toml`, or the defaults if the directory has none.
pub fn load_config(dir: &Path) -> Result<WeaveConfig, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(WeaveConfig::default());
    }
    load_config_file(&path)
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<WeaveConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<WeaveConfig, ConfigError> {
    let config: WeaveConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Checks settings that parse but cannot be used.
///
/// Callers that override a loaded configuration (e.g. from the command line)
/// run this again on the result.
pub fn validate_config(config: &WeaveConfig) -> Result<(), ConfigError> {
    if config.optimizer.max_iterations == 0 {
        return Err(ConfigError::Invalid {
            key: "optimizer.max_iterations",
            reason: "must be at least 1".to_string(),
        });
    }
    if let Some(name) = config
        .optimizer
        .disabled_passes
        .iter()
        .find(|name| name.trim().is_empty())
    {
        return Err(ConfigError::Invalid {
            key: "optimizer.disabled_passes",
            reason: format!("contains an empty pass name ({name:?})"),
        });
    }
    Ok(())
}
