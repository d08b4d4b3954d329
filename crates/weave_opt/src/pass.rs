//! The cleanup pass trait.

use crate::session::CleanupSession;
use weave_graph::GraphError;

/// A rewrite over a behavior graph.
///
/// A pass inspects the graph through the session and rewrites it only
/// through the session's primitives, so that change tracking and deferred
/// removal stay consistent. Passes hold no state between runs.
pub trait CleanupPass: Send + Sync {
    /// Stable kebab-case name, used in configuration and statistics.
    fn name(&self) -> &'static str;

    /// One-line human-readable description.
    fn description(&self) -> &'static str;

    /// Runs the pass once.
    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError>;
}
