//! Parsing and validation of `weave.toml` configuration files.
//!
//! Every section and field is optional; a missing file section falls back to
//! the defaults documented on each type.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    load_config, load_config_file, load_config_from_str, validate_config, CONFIG_FILE_NAME,
};
pub use types::*;
