//! Structural validation of a graph before optimization.

use crate::node::ValueSource;
use crate::store::GraphStore;
use weave_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

/// A value input reads from a node index past the end of the graph.
pub const DANGLING_VALUE: DiagnosticCode = DiagnosticCode::new(Category::Structure, 101);
/// A value input reads an output socket its producer does not declare.
pub const MISSING_OUTPUT: DiagnosticCode = DiagnosticCode::new(Category::Structure, 102);
/// An output flow continues into a node index past the end of the graph.
pub const DANGLING_FLOW: DiagnosticCode = DiagnosticCode::new(Category::Structure, 103);
/// An output flow continues into an input flow socket its target does not declare.
pub const MISSING_FLOW_INPUT: DiagnosticCode = DiagnosticCode::new(Category::Structure, 104);
/// A variable op names a variable index past the end of the variable table.
pub const VARIABLE_OUT_OF_RANGE: DiagnosticCode = DiagnosticCode::new(Category::Structure, 105);
/// Value edges form a cycle, so no producer-first order exists.
pub const VALUE_CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Structure, 106);

impl GraphStore {
    /// Checks every edge and variable reference, emitting one error per problem.
    ///
    /// Returns `true` when the graph is well formed.
    pub fn validate(&self, sink: &DiagnosticSink) -> bool {
        let errors_before = sink.error_count();
        let report = |diag: Diagnostic| sink.emit(diag);

        for (id, node) in self.nodes.iter() {
            for (input, source) in &node.values {
                let ValueSource::Connected(r) = source else {
                    continue;
                };
                match self.nodes.try_get(r.node) {
                    None => report(
                        Diagnostic::new(
                            DANGLING_VALUE,
                            format!(
                                "value input `{input}` of `{}` reads from node #{}, which does not exist",
                                node.op, r.node
                            ),
                        )
                        .at_node(id.index()),
                    ),
                    Some(producer) if !producer.outputs.contains_key(&r.socket) => report(
                        Diagnostic::new(
                            MISSING_OUTPUT,
                            format!(
                                "value input `{input}` reads output `{}` of node #{}, which `{}` does not declare",
                                r.socket, r.node, producer.op
                            ),
                        )
                        .at_node(id.index()),
                    ),
                    Some(_) => {}
                }
            }

            for (flow_out, target) in &node.flows {
                let Some(t) = target else {
                    continue;
                };
                match self.nodes.try_get(t.node) {
                    None => report(
                        Diagnostic::new(
                            DANGLING_FLOW,
                            format!(
                                "flow `{flow_out}` continues into node #{}, which does not exist",
                                t.node
                            ),
                        )
                        .at_node(id.index()),
                    ),
                    Some(next) if !next.input_flows.contains(&t.socket) => report(
                        Diagnostic::new(
                            MISSING_FLOW_INPUT,
                            format!(
                                "flow `{flow_out}` continues into `{}` of node #{}, which has no such input flow",
                                t.socket, t.node
                            ),
                        )
                        .at_node(id.index())
                        .with_note(format!("`{}` declares {:?}", next.op, next.input_flows)),
                    ),
                    Some(_) => {}
                }
            }

            for index in node.variable_indices() {
                if index < 0 || index as usize >= self.variables.len() {
                    report(
                        Diagnostic::new(
                            VARIABLE_OUT_OF_RANGE,
                            format!(
                                "`{}` refers to variable #{index}, but the graph has {} variables",
                                node.op,
                                self.variables.len()
                            ),
                        )
                        .at_node(id.index()),
                    );
                }
            }
        }

        // only meaningful once every edge is known to be in range
        if sink.error_count() == errors_before {
            if let Ok(Some(node)) = self.find_value_cycle() {
                report(
                    Diagnostic::new(
                        VALUE_CYCLE,
                        format!("value inputs of `{}` depend on its own output", self.nodes[node].op),
                    )
                    .at_node(node.index())
                    .with_help("break the cycle with a variable written by a flow node"),
                );
            }
        }
        sink.error_count() == errors_before
    }
}
