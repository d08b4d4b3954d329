//! Shared steps of the CLI commands: config resolution, graph I/O, and
//! diagnostic rendering.

use std::fs;
use std::path::Path;

use weave_common::{InternalError, Stage, WeaveResult};
use weave_config::WeaveConfig;
use weave_diagnostics::{Diagnostic, DiagnosticRenderer, DiagnosticSink, TerminalRenderer};
use weave_graph::GraphStore;

use crate::GlobalArgs;

/// Loads `--config` if given, otherwise `weave.toml` from the current directory.
pub fn load_config(global: &GlobalArgs) -> Result<WeaveConfig, Box<dyn std::error::Error>> {
    let config = match &global.config {
        Some(path) => weave_config::load_config_file(Path::new(path))?,
        None => weave_config::load_config(&std::env::current_dir()?)?,
    };
    Ok(config)
}

/// Reads a graph from its JSON form.
pub fn read_graph(path: &Path) -> Result<GraphStore, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let store = serde_json::from_str(&content)
        .map_err(|e| format!("{} is not a behavior graph: {e}", path.display()))?;
    Ok(store)
}

/// Serializes a graph to JSON text.
pub fn graph_to_json(store: &GraphStore, pretty: bool) -> WeaveResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(store)
    } else {
        serde_json::to_string(store)
    };
    let mut json = json.map_err(|e| InternalError::new(Stage::Serialization, e.to_string()))?;
    json.push('\n');
    Ok(json)
}

/// Writes `json` to `path`, or to stdout when `path` is `None`.
pub fn write_output(path: Option<&Path>, json: &str) -> std::io::Result<()> {
    match path {
        Some(path) => fs::write(path, json),
        None => {
            print!("{json}");
            Ok(())
        }
    }
}

/// Renders every diagnostic in `sink` to stderr.
///
/// In quiet mode only errors are shown.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) -> Vec<Diagnostic> {
    let diagnostics = sink.take_all();
    let renderer = TerminalRenderer::new(global.color);
    for diag in &diagnostics {
        if global.quiet && !diag.severity.is_error() {
            continue;
        }
        eprint!("{}", renderer.render(diag));
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_common::{Value, ValueType};
    use weave_graph::{Node, Op};

    fn global(config: Option<String>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config,
        }
    }

    #[test]
    fn explicit_config_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[optimizer]\nmax_iterations = 3\n").unwrap();
        let config = load_config(&global(Some(path.display().to_string()))).unwrap();
        assert_eq!(config.optimizer.max_iterations, 3);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(&global(Some(path.display().to_string()))).is_err());
    }

    #[test]
    fn graph_file_round_trip() {
        let mut store = GraphStore::new();
        let get = store.add_node(
            Node::new(Op::PointerGet)
                .with_config("pointer", Value::String("/nodes/0/scale".into()))
                .with_output("value", ValueType::Float3),
        );
        store.add_node(Node::new(Op::PointerSet).with_input("value", get, "value"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let json = graph_to_json(&store, false).unwrap();
        write_output(Some(&path), &json).unwrap();
        assert_eq!(read_graph(&path).unwrap(), store);
    }

    #[test]
    fn malformed_graph_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{\"nodes\": 3}").unwrap();
        let err = read_graph(&path).unwrap_err().to_string();
        assert!(err.contains("broken.json"));
    }

    #[test]
    fn rendering_drains_the_sink() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::new(
            weave_graph::validate::DANGLING_VALUE,
            "value input `a` reads from node #9, which does not exist",
        ));
        let rendered = render_diagnostics(&sink, &global(None));
        assert_eq!(rendered.len(), 1);
        assert!(sink.diagnostics().is_empty());
    }
}
