//! Control-flow collapsing for sequences and wait-all joins.

use crate::pass::CleanupPass;
use crate::session::CleanupSession;
use tracing::trace;
use weave_graph::{GraphError, NodeId, Op};

/// Whether removing `id` would strand a flow: `out` loops back into the node,
/// or some other node enters it through an input outside `rewired`.
fn would_strand_flow(
    session: &CleanupSession<'_>,
    id: NodeId,
    out: Option<&str>,
    rewired: &[&str],
) -> bool {
    let loops_back = out
        .and_then(|slot| session.node(id).flows.get(slot))
        .is_some_and(|next| matches!(next, Some(t) if t.node == id));
    loops_back
        || session
            .flows_into(id)
            .iter()
            .any(|u| u.source != id && !rewired.contains(&u.flow_in.as_str()))
}

/// Strips unconnected slots from `flow/sequence` nodes and removes sequences
/// left with at most one slot, routing `in` straight to that slot.
///
/// A sequence whose remaining slot re-enters the sequence is kept.
pub struct SequenceCollapsePass;

impl CleanupPass for SequenceCollapsePass {
    fn name(&self) -> &'static str {
        "sequence-collapse"
    }

    fn description(&self) -> &'static str {
        "Removes empty sequence slots and sequences with a single slot"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        for id in session.live_nodes_where(|n| n.op == Op::Sequence) {
            let dangling: Vec<String> = session
                .node(id)
                .flows
                .iter()
                .filter(|(_, target)| target.is_none())
                .map(|(name, _)| name.clone())
                .collect();
            for slot in &dangling {
                session.remove_flow_output(id, slot);
            }

            let slots: Vec<String> = session.node(id).flows.keys().cloned().collect();
            if slots.len() > 1 || !session.uses_of(id).is_empty() {
                continue;
            }
            if would_strand_flow(session, id, slots.first().map(String::as_str), &["in"]) {
                continue;
            }
            match slots.first() {
                Some(slot) => session.by_pass_flow(id, "in", slot),
                None => session.redirect_flow_input(id, "in", None),
            };
            trace!(node = %id, "collapsed sequence");
            session.remove_node(id);
        }
        Ok(())
    }
}

/// Removes `flow/waitAll` nodes waiting on at most one input.
///
/// Input `0` is routed straight to `completed` and `reset` is terminated.
/// A join whose `remainingInputs` output is read is kept, as is one entered
/// through any other input or whose `completed` flow loops back into itself.
pub struct WaitAllCollapsePass;

impl CleanupPass for WaitAllCollapsePass {
    fn name(&self) -> &'static str {
        "wait-all-collapse"
    }

    fn description(&self) -> &'static str {
        "Removes wait-all joins over a single input"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        for id in session.live_nodes_where(|n| n.op == Op::WaitAll) {
            let Some(inputs) = session.node(id).config_int("inputFlows") else {
                continue;
            };
            if inputs > 1 || !session.uses_of(id).is_empty() {
                continue;
            }
            if would_strand_flow(session, id, Some("completed"), &["0", "reset"]) {
                continue;
            }
            session.by_pass_flow(id, "0", "completed");
            session.redirect_flow_input(id, "reset", None);
            trace!(node = %id, inputs, "collapsed wait-all");
            session.remove_node(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::run_once;
    use weave_common::Value;
    use weave_graph::{FlowTarget, GraphStore, NodeId};

    fn action(store: &mut GraphStore, name: &str) -> NodeId {
        store.create_node(Op::Other(name.into()))
    }

    #[test]
    fn dangling_sequence_is_removed() {
        let mut store = GraphStore::new();
        let start = store.create_node(Op::OnStart);
        let seq = store.create_node(Op::Sequence);
        store.node_mut(seq).flows.insert("0".into(), None);
        store.node_mut(seq).flows.insert("1".into(), None);
        store.connect_flow(start, "out", seq, "in");

        assert!(run_once(&SequenceCollapsePass, &mut store));
        assert_eq!(store.len(), 1);
        assert_eq!(store.node(start).flows["out"], None);
    }

    #[test]
    fn single_slot_sequence_is_bypassed() {
        let mut store = GraphStore::new();
        let start = store.create_node(Op::OnStart);
        let seq = store.create_node(Op::Sequence);
        let log = action(&mut store, "debug/log");
        store.connect_flow(start, "out", seq, "in");
        store.node_mut(seq).flows.insert("0".into(), None);
        store.connect_flow(seq, "1", log, "in");

        assert!(run_once(&SequenceCollapsePass, &mut store));
        assert_eq!(store.len(), 2);
        assert_eq!(store.node(start).flows["out"], Some(FlowTarget::new(NodeId::from_raw(1), "in")));
    }

    #[test]
    fn multi_slot_sequence_is_only_stripped() {
        let mut store = GraphStore::new();
        let seq = store.create_node(Op::Sequence);
        let a = action(&mut store, "debug/a");
        let b = action(&mut store, "debug/b");
        store.connect_flow(seq, "0", a, "in");
        store.node_mut(seq).flows.insert("1".into(), None);
        store.connect_flow(seq, "2", b, "in");

        assert!(run_once(&SequenceCollapsePass, &mut store));
        assert_eq!(store.len(), 3);
        let slots: Vec<_> = store.node(seq).flows.keys().cloned().collect();
        assert_eq!(slots, vec!["0", "2"]);
        assert!(!run_once(&SequenceCollapsePass, &mut store));
    }

    fn wait_all(store: &mut GraphStore, inputs: i32) -> (NodeId, NodeId, NodeId, NodeId) {
        let start = store.create_node(Op::OnStart);
        let reset = store.create_node(Op::OnTick);
        let join = store.create_node(Op::WaitAll);
        store.set_configuration(join, "inputFlows", Value::Int(inputs));
        store.node_mut(join).input_flows = vec!["0".into(), "reset".into()];
        let done = action(store, "debug/done");
        store.connect_flow(start, "out", join, "0");
        store.connect_flow(reset, "out", join, "reset");
        store.connect_flow(join, "completed", done, "in");
        (start, reset, join, done)
    }

    #[test]
    fn single_input_wait_all_is_bypassed() {
        let mut store = GraphStore::new();
        let (start, reset, _, _) = wait_all(&mut store, 1);

        assert!(run_once(&WaitAllCollapsePass, &mut store));
        assert_eq!(store.len(), 3);
        let done = NodeId::from_raw(2);
        assert_eq!(store.node(start).flows["out"], Some(FlowTarget::new(done, "in")));
        assert_eq!(store.node(reset).flows["out"], None);
    }

    #[test]
    fn multi_input_wait_all_is_kept() {
        let mut store = GraphStore::new();
        wait_all(&mut store, 2);
        assert!(!run_once(&WaitAllCollapsePass, &mut store));
    }

    #[test]
    fn read_remaining_inputs_blocks_collapse() {
        let mut store = GraphStore::new();
        let (_, _, join, _) = wait_all(&mut store, 1);
        let log = action(&mut store, "debug/log");
        store.connect_value(log, "message", join, "remainingInputs");
        assert!(!run_once(&WaitAllCollapsePass, &mut store));
    }

    #[test]
    fn self_looping_sequence_is_kept() {
        let mut store = GraphStore::new();
        let start = store.create_node(Op::OnStart);
        let seq = store.create_node(Op::Sequence);
        store.connect_flow(start, "out", seq, "in");
        store.connect_flow(seq, "0", seq, "in");
        store.node_mut(seq).flows.insert("1".into(), None);

        // the empty slot is still stripped
        assert!(run_once(&SequenceCollapsePass, &mut store));
        assert_eq!(store.len(), 2);
        assert_eq!(store.node(seq).flows.len(), 1);
        assert_eq!(store.node(start).flows["out"], Some(FlowTarget::new(seq, "in")));
        assert!(!run_once(&SequenceCollapsePass, &mut store));
    }

    #[test]
    fn wait_all_entered_through_extra_input_is_kept() {
        let mut store = GraphStore::new();
        let (_, _, join, _) = wait_all(&mut store, 1);
        let extra = store.create_node(Op::OnTick);
        store.connect_flow(extra, "out", join, "1");

        assert!(!run_once(&WaitAllCollapsePass, &mut store));
        assert_eq!(store.len(), 5);
        assert_eq!(store.node(extra).flows["out"], Some(FlowTarget::new(join, "1")));
    }

    #[test]
    fn wait_all_completing_into_itself_is_kept() {
        let mut store = GraphStore::new();
        let (_, _, join, _) = wait_all(&mut store, 1);
        store.connect_flow(join, "completed", join, "reset");

        assert!(!run_once(&WaitAllCollapsePass, &mut store));
        assert_eq!(store.len(), 4);
    }
}
