//! Error types for configuration loading and validation.

use std::path::PathBuf;

/// Why a `weave.toml` could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file named by `--config` could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has a field of the wrong type.
    #[error("malformed weave.toml: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting parsed but has an unusable value.
    #[error("`{key}` {reason}")]
    Invalid {
        /// Dotted path of the setting, e.g. `optimizer.max_iterations`.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
