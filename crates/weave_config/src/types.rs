//! Configuration types deserialized from `weave.toml`.

use serde::{Deserialize, Serialize};

/// The whole `weave.toml` file.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct WeaveConfig {
    /// The `[optimizer]` section.
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    /// The `[output]` section.
    #[serde(default)]
    pub output: OutputConfig,
    /// The `[log]` section.
    #[serde(default)]
    pub log: LogConfig,
}

/// How the cleanup loop runs.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Upper bound on cleanup cycles before giving up on reaching a fixpoint.
    pub max_iterations: u32,
    /// Pass names to skip.
    pub disabled_passes: Vec<String>,
    /// Sweep nodes without any edge before the cleanup loop.
    pub remove_unconnected: bool,
    /// Drop variables no node refers to after the cleanup loop.
    pub compact_variables: bool,
    /// Validate the graph before optimizing and refuse malformed input.
    pub validate: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 32,
            disabled_passes: Vec::new(),
            remove_unconnected: true,
            compact_variables: false,
            validate: true,
        }
    }
}

/// How the optimized graph is written.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Reorder nodes producer-first before writing.
    pub topological_sort: bool,
    /// Pretty-print the JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            topological_sort: true,
            pretty: true,
        }
    }
}

/// The `[log]` section.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default log level when `RUST_LOG` is not set.
    pub level: LogLevel,
}

/// Log verbosity.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Per-run summaries.
    #[default]
    Info,
    /// Per-pass changes.
    Debug,
    /// Every individual rewrite.
    Trace,
}

impl LogLevel {
    /// Returns the level as an env-filter directive.
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
