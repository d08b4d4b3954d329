//! Cleanup passes and the fixpoint driver for behavior graphs.
//!
//! A [`CleanupRegistry`] holds an ordered list of [`CleanupPass`]es. One
//! cleanup cycle runs every enabled pass once; [`optimize`] repeats cycles
//! until nothing changes, bracketed by validation and sweeping steps taken
//! from the [`OptimizerConfig`].

#![warn(missing_docs)]

pub mod pass;
pub mod passes;
pub mod registry;
pub mod session;

pub use pass::CleanupPass;
pub use passes::register_builtin_passes;
pub use registry::{CleanupRegistry, CleanupStats};
pub use session::CleanupSession;

use tracing::info;
use weave_config::OptimizerConfig;
use weave_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use weave_graph::{GraphError, GraphStore};

/// The cleanup loop hit `max_iterations` while passes were still changing the graph.
pub const NOT_CONVERGED: DiagnosticCode = DiagnosticCode::new(Category::Cleanup, 201);
/// A disabled pass name matches no registered pass.
pub const UNKNOWN_PASS: DiagnosticCode = DiagnosticCode::new(Category::Cleanup, 202);
/// Summary of an optimize run.
pub const SUMMARY: DiagnosticCode = DiagnosticCode::new(Category::Summary, 301);

/// Why [`optimize`] gave up.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    /// Validation reported errors; details are in the diagnostic sink.
    #[error("graph failed validation with {errors} error(s)")]
    InvalidGraph {
        /// Number of validation errors.
        errors: usize,
    },
    /// A rewrite broke a graph invariant.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Runs the builtin cleanup passes over `store` until a fixpoint.
///
/// Steps, each gated by `config`: validation, the unconnected-node sweep,
/// the cleanup loop, and variable compaction. Warnings and the run summary
/// go to `sink`.
pub fn optimize(
    store: &mut GraphStore,
    config: &OptimizerConfig,
    sink: &DiagnosticSink,
) -> Result<CleanupStats, OptimizeError> {
    if config.validate && !store.validate(sink) {
        return Err(OptimizeError::InvalidGraph {
            errors: sink.error_count(),
        });
    }

    let nodes_before = store.len();
    if config.remove_unconnected {
        store.remove_unconnected_nodes()?;
    }

    let mut registry = CleanupRegistry::with_builtin_passes();
    for name in &config.disabled_passes {
        if !registry.disable(name) {
            sink.emit(
                Diagnostic::new(UNKNOWN_PASS, format!("unknown cleanup pass `{name}`"))
                    .with_help("run `weave passes` to list the available passes"),
            );
        }
    }

    let mut stats = registry.run_to_fixpoint(store, config.max_iterations)?;
    stats.nodes_before = nodes_before;
    if !stats.converged {
        sink.emit(
            Diagnostic::new(
                NOT_CONVERGED,
                format!(
                    "cleanup did not converge within {} iteration(s)",
                    config.max_iterations
                ),
            )
            .with_help("raise `optimizer.max_iterations` in weave.toml"),
        );
    }

    if config.compact_variables {
        store.compact_variables()?;
    }

    info!(
        nodes_before = stats.nodes_before,
        nodes_after = stats.nodes_after,
        iterations = stats.iterations,
        "optimized graph"
    );
    sink.emit(Diagnostic::new(
        SUMMARY,
        format!(
            "removed {} of {} node(s) in {} iteration(s)",
            stats.nodes_removed(),
            stats.nodes_before,
            stats.iterations
        ),
    ));
    Ok(stats)
}
