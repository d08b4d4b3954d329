//! Replaces reads of never-written variables with their defaults.

use crate::pass::CleanupPass;
use crate::session::CleanupSession;
use std::collections::HashSet;
use tracing::{trace, warn};
use weave_graph::{GraphError, Op, VariableId};

/// Folds `variable/get` nodes whose variable no set or interpolate node writes.
///
/// Such a variable holds its default for the whole run, so every reader gets
/// the default as a literal and the get node is dropped. The variable table
/// itself is left alone.
pub struct DeadVariablePass;

impl CleanupPass for DeadVariablePass {
    fn name(&self) -> &'static str {
        "dead-variable"
    }

    fn description(&self) -> &'static str {
        "Replaces reads of never-written variables with their default value"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        let written: HashSet<i32> = session
            .live_nodes()
            .into_iter()
            .flat_map(|id| session.node(id).written_variables())
            .collect();

        for id in session.live_nodes_where(|n| n.op == Op::VariableGet) {
            let Some(index) = session.node(id).config_int("variable") else {
                continue;
            };
            if written.contains(&index) {
                continue;
            }
            let Some(variable) = u32::try_from(index)
                .ok()
                .map(VariableId::from_raw)
                .and_then(|v| session.store().variables.try_get(v))
            else {
                warn!(node = %id, variable = index, "variable/get names a missing variable");
                continue;
            };
            if !session.only_read_through(id, "value") {
                continue;
            }
            let default = variable.value.clone();
            trace!(node = %id, variable = index, value = %default, "inlined unwritten variable");
            session.replace_output_with_literal(id, "value", default);
            session.remove_node(id);
        }
        Ok(())
    }
}
