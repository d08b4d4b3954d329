//! `weave optimize`: validate, clean up, reorder, and write a graph.

use std::path::Path;

use tracing::{debug, info};
use weave_common::{InternalError, Stage};
use weave_config::{ConfigError, WeaveConfig};
use weave_diagnostics::DiagnosticSink;
use weave_graph::GraphError;
use weave_opt::OptimizeError;

use crate::pipeline::{graph_to_json, read_graph, render_diagnostics, write_output};
use crate::{GlobalArgs, OptimizeArgs};

/// Runs the `weave optimize` command.
///
/// Returns exit code 0 on success, 1 if the input graph failed validation.
/// A rewrite or reordering that breaks the graph is an [`InternalError`].
pub fn run(
    args: &OptimizeArgs,
    config: &WeaveConfig,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = config.clone();
    merge_args(&mut config, args)?;

    let mut store = read_graph(Path::new(&args.input))?;
    debug!(input = %args.input, nodes = store.len(), "loaded graph");
    let sink = DiagnosticSink::new();

    let stats = match weave_opt::optimize(&mut store, &config.optimizer, &sink) {
        Ok(stats) => stats,
        Err(OptimizeError::InvalidGraph { errors }) => {
            render_diagnostics(&sink, global);
            eprintln!("error: {} has {errors} structural error(s)", args.input);
            return Ok(1);
        }
        Err(OptimizeError::Graph(e)) => return Err(internal(Stage::Cleanup)(e).into()),
    };

    if config.output.topological_sort
        && store.sort_topologically().map_err(internal(Stage::Ordering))?
    {
        debug!("reordered output producer-first");
    }
    let json = graph_to_json(&store, config.output.pretty)?;
    let hash = store.content_hash()?;
    write_output(args.output.as_deref().map(Path::new), &json)?;
    if let Some(output) = &args.output {
        info!(output = %output, nodes = store.len(), %hash, "wrote optimized graph");
    }

    render_diagnostics(&sink, global);
    if global.verbose {
        for (pass, changes) in &stats.pass_changes {
            eprintln!("   {pass:<20} {changes} change(s)");
        }
    }
    if !global.quiet {
        eprintln!(
            "   Optimized {} -> {} node(s) [{}]",
            stats.nodes_before,
            store.len(),
            hash.short()
        );
    }
    Ok(0)
}

fn internal(stage: Stage) -> impl FnOnce(GraphError) -> InternalError {
    move |e| InternalError::new(stage, e.to_string())
}

/// Applies command-line overrides on top of the loaded configuration and
/// checks the result the same way a loaded file is checked.
fn merge_args(config: &mut WeaveConfig, args: &OptimizeArgs) -> Result<(), ConfigError> {
    if let Some(max) = args.max_iterations {
        config.optimizer.max_iterations = max;
    }
    for name in &args.disable {
        if !config.optimizer.disabled_passes.contains(name) {
            config.optimizer.disabled_passes.push(name.clone());
        }
    }
    if args.no_sort {
        config.output.topological_sort = false;
    }
    weave_config::validate_config(config)
}
