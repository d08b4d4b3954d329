//! `weave validate`: structural checks without rewriting.

use std::path::Path;

use weave_diagnostics::DiagnosticSink;

use crate::pipeline::{read_graph, render_diagnostics};
use crate::GlobalArgs;

/// Runs the `weave validate` command.
///
/// Returns exit code 0 if the graph is well formed, 1 otherwise.
pub fn run(input: &str, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let store = read_graph(Path::new(input))?;
    let sink = DiagnosticSink::new();
    let ok = store.validate(&sink);

    let diagnostics = render_diagnostics(&sink, global);
    let errors = diagnostics.iter().filter(|d| d.severity.is_error()).count();
    if !global.quiet {
        eprintln!(
            "   Checked {} node(s), {} variable(s): {errors} error(s)",
            store.len(),
            store.variables.len()
        );
    }
    Ok(if ok { 0 } else { 1 })
}
