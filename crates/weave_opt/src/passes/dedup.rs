//! Structural deduplication: merging nodes that provably compute the same thing.
//!
//! Every pass here walks candidates in index order, so the lowest-index node
//! of each equivalence class survives and later duplicates are rewired onto it.

use crate::pass::CleanupPass;
use crate::session::CleanupSession;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::trace;
use weave_common::Value;
use weave_graph::{GraphError, Node, NodeId, Op, ValueSource};

/// Rewires each candidate onto the first earlier candidate with the same key.
fn merge_duplicates<K: Hash + Eq>(
    session: &mut CleanupSession<'_>,
    candidates: Vec<NodeId>,
    key_of: impl Fn(&Node) -> Option<K>,
) {
    let mut seen: HashMap<K, NodeId> = HashMap::new();
    for id in candidates {
        if session.is_removed(id) {
            continue;
        }
        let Some(key) = key_of(session.node(id)) else {
            continue;
        };
        match seen.entry(key) {
            Entry::Occupied(entry) => {
                let survivor = *entry.get();
                trace!(duplicate = %id, survivor = %survivor, "merged duplicate node");
                session.replace_node_uses(id, survivor);
                session.remove_node(id);
            }
            Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }
    }
}

/// Identity of a pure value node: op, declared outputs, and every input.
#[derive(Hash, PartialEq, Eq)]
struct CseKey {
    op: Op,
    outputs: Vec<String>,
    inputs: Vec<(String, ValueSource)>,
}

/// A node is a pure value node if it has no control flow, no configuration,
/// and at least one value input. Zero-input ops such as `math/random` are
/// not deterministic and never merge.
fn is_pure_value_node(node: &Node) -> bool {
    node.flows.is_empty()
        && node.input_flows.is_empty()
        && node.configuration.is_empty()
        && !node.values.is_empty()
        && !node.op.is_event()
}

fn cse_key(node: &Node) -> Option<CseKey> {
    if !is_pure_value_node(node) {
        return None;
    }
    let mut outputs: Vec<String> = node.outputs.keys().cloned().collect();
    outputs.sort();
    let mut inputs: Vec<(String, ValueSource)> = node
        .values
        .iter()
        .map(|(name, source)| (name.clone(), source.clone()))
        .collect();
    inputs.sort_by(|a, b| a.0.cmp(&b.0));
    Some(CseKey {
        op: node.op.clone(),
        outputs,
        inputs,
    })
}

/// Common subexpression elimination over pure value nodes.
pub struct CsePass;

impl CleanupPass for CsePass {
    fn name(&self) -> &'static str {
        "cse"
    }

    fn description(&self) -> &'static str {
        "Merges pure value nodes with identical op and inputs"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        let candidates = session.live_nodes_where(is_pure_value_node);
        merge_duplicates(session, candidates, cse_key);
        Ok(())
    }
}

/// Merges `pointer/get` nodes reading the same pointer with the same argument.
///
/// Only single-input pointer reads are considered. The key is the whole
/// configuration (pointer template and any other settings), the input's name,
/// and its source.
pub struct PointerGetDedupPass;

impl CleanupPass for PointerGetDedupPass {
    fn name(&self) -> &'static str {
        "pointer-get-dedup"
    }

    fn description(&self) -> &'static str {
        "Merges pointer reads with identical template and argument"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        let candidates = session.live_nodes_where(|n| n.op == Op::PointerGet && n.values.len() == 1);
        merge_duplicates(session, candidates, |node| {
            let (input, source) = node.values.first()?;
            let config: Vec<(String, Value)> = node
                .configuration
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Some((config, input.clone(), source.clone()))
        });
        Ok(())
    }
}

/// Merges `math/matDecompose` nodes decomposing the same matrix.
pub struct DecomposeDedupPass;

impl CleanupPass for DecomposeDedupPass {
    fn name(&self) -> &'static str {
        "decompose-dedup"
    }

    fn description(&self) -> &'static str {
        "Merges matrix decompositions of the same input"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        let candidates = session.live_nodes_where(|n| n.op == Op::MatDecompose);
        merge_duplicates(session, candidates, |node| node.values.get("a").cloned());
        Ok(())
    }
}

/// Merges `variable/get` nodes reading the same variable.
pub struct VariableGetDedupPass;

impl CleanupPass for VariableGetDedupPass {
    fn name(&self) -> &'static str {
        "variable-get-dedup"
    }

    fn description(&self) -> &'static str {
        "Merges reads of the same variable"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        let candidates = session.live_nodes_where(|n| n.op == Op::VariableGet);
        merge_duplicates(session, candidates, |node| node.config_int("variable"));
        Ok(())
    }
}

/// Collapses all `event/onTick` nodes onto the first one.
///
/// A later tick's flow moves onto the survivor when the survivor has none.
/// A later tick whose flow cannot move is kept, though its value readers
/// (the tick's time outputs) still move to the survivor.
pub struct TickDedupPass;

const TICK_OUT: &str = "out";

impl CleanupPass for TickDedupPass {
    fn name(&self) -> &'static str {
        "tick-dedup"
    }

    fn description(&self) -> &'static str {
        "Collapses per-frame tick events onto a single node"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        let ticks = session.live_nodes_where(|n| n.op == Op::OnTick);
        let Some((&survivor, rest)) = ticks.split_first() else {
            return Ok(());
        };
        for &tick in rest {
            let mut keep = false;
            if let Some(target) = session.node(tick).flows.get(TICK_OUT).cloned().flatten() {
                let survivor_has_flow = session
                    .node(survivor)
                    .flows
                    .get(TICK_OUT)
                    .is_some_and(Option::is_some);
                if survivor_has_flow {
                    keep = true;
                } else {
                    session.connect_flow(survivor, TICK_OUT, target.node, &target.socket);
                }
            }
            session.replace_node_uses(tick, survivor);
            if !keep {
                trace!(tick = %tick, survivor = %survivor, "merged tick event");
                session.remove_node(tick);
            }
        }
        Ok(())
    }
}
