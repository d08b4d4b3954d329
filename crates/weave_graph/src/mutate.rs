//! Mutation primitives used by the optimizer.
//!
//! Every rewrite is expressed through these: edge retargeting first, node
//! removal last. Retargeting primitives return whether anything changed.

use crate::error::GraphError;
use crate::ids::NodeId;
use crate::node::{FlowTarget, ValueSource};
use crate::store::GraphStore;
use std::collections::HashSet;
use tracing::trace;
use weave_common::Value;

impl GraphStore {
    /// Removes one node. See [`remove_nodes`](Self::remove_nodes).
    pub fn remove_node(&mut self, node: NodeId) -> Result<(), GraphError> {
        self.remove_nodes(&HashSet::from([node]))
    }

    /// Removes a set of nodes in one order-preserving sweep.
    ///
    /// Surviving nodes are renumbered densely and every surviving edge is
    /// rewritten. Fails without modifying the graph if an index is out of range
    /// or if a surviving node still references a removed one.
    pub fn remove_nodes(&mut self, removed: &HashSet<NodeId>) -> Result<(), GraphError> {
        if removed.is_empty() {
            return Ok(());
        }
        let len = self.nodes.len();
        if let Some(&node) = removed.iter().find(|id| id.index() >= len) {
            return Err(GraphError::NodeOutOfRange { node, len });
        }
        for (id, node) in self.nodes.iter() {
            if removed.contains(&id) {
                continue;
            }
            if let Some(target) = node
                .value_dependencies()
                .chain(node.flow_successors())
                .find(|dep| removed.contains(dep))
            {
                return Err(GraphError::DanglingReference { node: id, target });
            }
        }

        let remap = self.nodes.retain(|id, _| !removed.contains(&id));
        for node in self.nodes.values_mut() {
            node.remap_nodes(|id| remap.get(id.index()).copied().flatten().unwrap_or(id));
        }
        trace!(removed = removed.len(), remaining = self.nodes.len(), "compacted node list");
        Ok(())
    }

    /// Routes every flow entering `(node, flow_in)` to where `node.flows[flow_out]` goes.
    ///
    /// If `flow_out` is unconnected the predecessors are left terminated.
    pub fn by_pass_flow(&mut self, node: NodeId, flow_in: &str, flow_out: &str) -> bool {
        let next = self.nodes[node].flows.get(flow_out).cloned().flatten();
        self.redirect_flow_input(node, flow_in, next)
    }

    /// Retargets every flow entering `(node, flow_in)` to `target`.
    ///
    /// `None` terminates those flows.
    pub fn redirect_flow_input(
        &mut self,
        node: NodeId,
        flow_in: &str,
        target: Option<FlowTarget>,
    ) -> bool {
        let mut changed = false;
        for n in self.nodes.values_mut() {
            for slot in n.flows.values_mut() {
                if matches!(slot, Some(t) if t.node == node && t.socket == flow_in) {
                    *slot = target.clone();
                    changed = true;
                }
            }
        }
        changed
    }

    /// Makes every reader of `(node, value_out)` hold `node.values[value_in]` instead.
    pub fn by_pass_value(
        &mut self,
        node: NodeId,
        value_in: &str,
        value_out: &str,
    ) -> Result<bool, GraphError> {
        self.by_pass_value_from(node, value_in, node, value_out)
    }

    /// Makes every reader of `(node, value_out)` hold `source.values[value_in]` instead.
    pub fn by_pass_value_from(
        &mut self,
        source: NodeId,
        value_in: &str,
        node: NodeId,
        value_out: &str,
    ) -> Result<bool, GraphError> {
        let replacement = self
            .nodes
            .try_get(source)
            .ok_or(GraphError::NodeOutOfRange {
                node: source,
                len: self.nodes.len(),
            })?
            .values
            .get(value_in)
            .cloned()
            .ok_or_else(|| GraphError::MissingSocket {
                node: source,
                socket: value_in.to_string(),
            })?;
        Ok(self.replace_output(node, value_out, &replacement))
    }

    /// Points every reader of any output of `old` at the same-named output of `new`.
    pub fn replace_node_uses(&mut self, old: NodeId, new: NodeId) -> bool {
        let mut changed = false;
        for n in self.nodes.values_mut() {
            for source in n.values.values_mut() {
                if let ValueSource::Connected(r) = source {
                    if r.node == old {
                        r.node = new;
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    /// Makes every reader of `(node, socket)` hold `value`.
    pub fn replace_output_with_literal(&mut self, node: NodeId, socket: &str, value: Value) -> bool {
        self.replace_output(node, socket, &ValueSource::Literal(value))
    }

    fn replace_output(&mut self, node: NodeId, socket: &str, replacement: &ValueSource) -> bool {
        let mut changed = false;
        for n in self.nodes.values_mut() {
            for source in n.values.values_mut() {
                if source.reads(node, socket) {
                    *source = replacement.clone();
                    changed = true;
                }
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::OutputRef;
    use crate::op::Op;

    /// `x -> add(a: x, b: 0) -> mul(a: add) -> log`
    fn chain() -> (GraphStore, [NodeId; 4]) {
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        let add = store.create_node(Op::Add);
        store.connect_value(add, "a", x, "value");
        store.set_value(add, "b", Value::Float(0.0));
        let mul = store.create_node(Op::Mul);
        store.connect_value(mul, "a", add, "value");
        store.set_value(mul, "b", Value::Float(2.0));
        let log = store.create_node(Op::Other("debug/log".into()));
        store.connect_value(log, "message", mul, "value");
        (store, [x, add, mul, log])
    }

    #[test]
    fn remove_renumbers_survivors() {
        let (mut store, [x, add, mul, log]) = chain();
        assert!(store.by_pass_value(add, "a", "value").unwrap());
        store.remove_node(add).unwrap();
        assert_eq!(store.len(), 3);
        // mul moved from #2 to #1 and now reads x directly
        let mul = NodeId::from_raw(mul.as_raw() - 1);
        assert_eq!(store.node(mul).values["a"], ValueSource::Connected(OutputRef::new(x, "value")));
        let log = NodeId::from_raw(log.as_raw() - 1);
        assert_eq!(
            store.node(log).values["message"],
            ValueSource::Connected(OutputRef::new(mul, "value"))
        );
    }

    #[test]
    fn remove_referenced_node_is_an_error() {
        let (mut store, [_, add, mul, _]) = chain();
        let before = store.clone();
        let err = store.remove_node(add).unwrap_err();
        assert_eq!(err, GraphError::DanglingReference { node: mul, target: add });
        assert_eq!(store, before);
    }

    #[test]
    fn remove_out_of_range() {
        let (mut store, _) = chain();
        let err = store.remove_node(NodeId::from_raw(9)).unwrap_err();
        assert_eq!(err, GraphError::NodeOutOfRange { node: NodeId::from_raw(9), len: 4 });
    }

    #[test]
    fn remove_several_at_once() {
        let (mut store, [x, add, mul, log]) = chain();
        store.remove_nodes(&HashSet::from([x, add, mul, log])).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn by_pass_value_copies_literals() {
        let (mut store, [_, _, mul, log]) = chain();
        assert!(store.by_pass_value(mul, "b", "value").unwrap());
        assert_eq!(store.node(log).values["message"], ValueSource::Literal(Value::Float(2.0)));
        assert!(!store.by_pass_value(mul, "b", "value").unwrap());
    }

    #[test]
    fn by_pass_value_missing_socket() {
        let (mut store, [_, add, _, _]) = chain();
        let err = store.by_pass_value(add, "c", "value").unwrap_err();
        assert_eq!(err, GraphError::MissingSocket { node: add, socket: "c".into() });
    }

    #[test]
    fn by_pass_flow_retargets_predecessors() {
        let mut store = GraphStore::new();
        let start = store.create_node(Op::OnStart);
        let seq = store.create_node(Op::Sequence);
        let log = store.create_node(Op::Other("debug/log".into()));
        store.connect_flow(start, "out", seq, "in");
        store.connect_flow(seq, "0", log, "in");
        assert!(store.by_pass_flow(seq, "in", "0"));
        assert_eq!(store.node(start).flows["out"], Some(FlowTarget::new(log, "in")));
    }

    #[test]
    fn redirect_flow_to_none_terminates() {
        let mut store = GraphStore::new();
        let start = store.create_node(Op::OnStart);
        let seq = store.create_node(Op::Sequence);
        store.connect_flow(start, "out", seq, "in");
        assert!(store.redirect_flow_input(seq, "in", None));
        assert_eq!(store.node(start).flows["out"], None);
        assert!(!store.redirect_flow_input(seq, "in", None));
    }

    #[test]
    fn replace_node_uses_keeps_socket_names() {
        let mut store = GraphStore::new();
        let d1 = store.create_node(Op::MatDecompose);
        let d2 = store.create_node(Op::MatDecompose);
        let user = store.create_node(Op::Add);
        store.connect_value(user, "a", d2, "translation");
        store.connect_value(user, "b", d2, "scale");
        assert!(store.replace_node_uses(d2, d1));
        assert!(store.node(user).values["a"].reads(d1, "translation"));
        assert!(store.node(user).values["b"].reads(d1, "scale"));
    }

    #[test]
    fn literal_replacement_only_touches_named_socket() {
        let mut store = GraphStore::new();
        let get = store.create_node(Op::PointerGet);
        let user = store.create_node(Op::Add);
        store.connect_value(user, "a", get, "value");
        store.connect_value(user, "b", get, "isValid");
        assert!(store.replace_output_with_literal(get, "value", Value::Float(5.0)));
        assert_eq!(store.node(user).values["a"], ValueSource::Literal(Value::Float(5.0)));
        assert!(store.node(user).values["b"].reads(get, "isValid"));
    }
}
