//! Merging of duplicate pointer-interaction events.

use crate::pass::CleanupPass;
use crate::session::CleanupSession;
use indexmap::IndexMap;
use tracing::trace;
use weave_common::Value;
use weave_graph::{GraphError, Node, NodeId, Op};

const EVENT_OUT: &str = "out";
const SEQUENCE_IN: &str = "in";

/// Merges `event/onSelect`, `event/onHoverIn` and `event/onHoverOut` nodes
/// that listen on the same scene node.
///
/// For each group of two or more, a `flow/sequence` is appended: the first
/// event now flows into it, and every group member's former flow target
/// becomes one of its output slots, in index order. The other events are
/// removed after their value readers are moved to the first.
pub struct EventFanInPass;

impl CleanupPass for EventFanInPass {
    fn name(&self) -> &'static str {
        "event-fan-in"
    }

    fn description(&self) -> &'static str {
        "Merges pointer events on the same scene node behind one sequence"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        for op in [Op::OnSelect, Op::OnHoverIn, Op::OnHoverOut] {
            let mut groups: IndexMap<Value, Vec<NodeId>> = IndexMap::new();
            for id in session.live_nodes_where(|n| n.op == op) {
                if let Some(target) = session.node(id).configuration.get("nodeIndex") {
                    groups.entry(target.clone()).or_default().push(id);
                }
            }
            for members in groups.into_values().filter(|g| g.len() > 1) {
                merge_group(session, &members);
            }
        }
        Ok(())
    }
}

/// Slot names sort in execution order: `s0`..`s9`, or `s00`..`s11`, etc.
fn slot_name(index: usize, count: usize) -> String {
    let width = count.saturating_sub(1).to_string().len();
    format!("s{index:0width$}")
}

fn merge_group(session: &mut CleanupSession<'_>, members: &[NodeId]) {
    let first = members[0];
    let targets: Vec<_> = members
        .iter()
        .filter_map(|&id| session.node(id).flows.get(EVENT_OUT).cloned().flatten())
        .collect();

    let mut sequence = Node::new(Op::Sequence);
    for (i, target) in targets.into_iter().enumerate() {
        sequence = sequence.with_flow_out(slot_name(i, members.len()), Some(target));
    }
    let sequence = session.add_node(sequence);
    session.connect_flow(first, EVENT_OUT, sequence, SEQUENCE_IN);

    for &other in &members[1..] {
        session.replace_node_uses(other, first);
        session.remove_node(other);
    }
    trace!(event = %first, merged = members.len(), sequence = %sequence, "fanned in pointer events");
}
