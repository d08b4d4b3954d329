//! Failures that indicate a bug rather than a bad graph.

use std::fmt;

/// Result of an operation whose failure is a Weave bug.
pub type WeaveResult<T> = Result<T, InternalError>;

/// Where in the export pipeline an invariant broke.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Stage {
    /// A cleanup pass left the graph inconsistent.
    Cleanup,
    /// Producer-first reordering failed.
    Ordering,
    /// The graph could not be written as JSON.
    Serialization,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Cleanup => "cleanup",
            Stage::Ordering => "ordering",
            Stage::Serialization => "serialization",
        })
    }
}

/// A broken invariant. Problems with the authored graph are diagnostics instead.
#[derive(Debug, thiserror::Error)]
#[error("internal error during {stage}: {message}")]
pub struct InternalError {
    /// Pipeline stage that failed.
    pub stage: Stage,
    /// What went wrong.
    pub message: String,
}

impl InternalError {
    /// Creates an internal error for `stage`.
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}
