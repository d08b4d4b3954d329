//! Whole-graph reshaping: producer-first ordering, the unconnected-node
//! sweep, and variable-table compaction.

use crate::error::GraphError;
use crate::ids::{NodeId, VariableId};
use crate::store::GraphStore;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{DfsPostOrder, VisitMap};
use std::collections::HashSet;
use tracing::debug;

impl GraphStore {
    /// Reorders nodes so that every value producer precedes its consumers.
    ///
    /// Nodes are visited in their current order and each one is emitted after
    /// its value dependencies, so an already ordered graph is left untouched.
    /// Flow edges do not constrain the order. Returns `true` if any node moved.
    pub fn sort_topologically(&mut self) -> Result<bool, GraphError> {
        let len = self.nodes.len();
        let (graph, indices) = self.dependency_graph()?;
        if let Err(cycle) = toposort(&graph, None) {
            return Err(GraphError::ValueCycle {
                node: graph[cycle.node_id()],
            });
        }

        let mut order = Vec::with_capacity(len);
        let mut dfs = DfsPostOrder::empty(&graph);
        for &start in &indices {
            if dfs.discovered.is_visited(&start) {
                continue;
            }
            dfs.move_to(start);
            while let Some(ix) = dfs.next(&graph) {
                order.push(graph[ix]);
            }
        }

        if order.iter().enumerate().all(|(i, id)| id.index() == i) {
            return Ok(false);
        }
        let remap = self.nodes.permute(&order);
        for node in self.nodes.values_mut() {
            node.remap_nodes(|id| remap.get(id.index()).copied().unwrap_or(id));
        }
        debug!(nodes = len, "reordered nodes producer-first");
        Ok(true)
    }

    /// Returns a node on a value-dependency cycle, if there is one.
    pub fn find_value_cycle(&self) -> Result<Option<NodeId>, GraphError> {
        let (graph, _) = self.dependency_graph()?;
        Ok(toposort(&graph, None).err().map(|cycle| graph[cycle.node_id()]))
    }

    /// Value dependencies as a petgraph graph, edges pointing consumer to producer.
    fn dependency_graph(&self) -> Result<(DiGraph<NodeId, ()>, Vec<NodeIndex>), GraphError> {
        let len = self.nodes.len();
        let mut graph: DiGraph<NodeId, ()> = DiGraph::with_capacity(len, len);
        let indices: Vec<NodeIndex> = self.nodes.ids().map(|id| graph.add_node(id)).collect();

        // consumer -> producer, so post-order yields producers first
        for (id, node) in self.nodes.iter() {
            for dep in node.value_dependencies() {
                let producer = indices
                    .get(dep.index())
                    .copied()
                    .ok_or(GraphError::NodeOutOfRange { node: dep, len })?;
                graph.update_edge(indices[id.index()], producer, ());
            }
        }
        Ok((graph, indices))
    }

    /// Removes every node that has no value or flow edge in either direction.
    ///
    /// Returns the number of nodes removed.
    pub fn remove_unconnected_nodes(&mut self) -> Result<usize, GraphError> {
        let mut connected = HashSet::new();
        for (id, node) in self.nodes.iter() {
            for other in node.value_dependencies().chain(node.flow_successors()) {
                connected.insert(other);
                connected.insert(id);
            }
        }
        let unconnected: HashSet<NodeId> = self
            .nodes
            .ids()
            .filter(|id| !connected.contains(id))
            .collect();
        let count = unconnected.len();
        self.remove_nodes(&unconnected)?;
        if count > 0 {
            debug!(removed = count, "removed unconnected nodes");
        }
        Ok(count)
    }

    /// Drops variables that no variable op refers to and renumbers the rest.
    ///
    /// Returns the number of variables removed.
    pub fn compact_variables(&mut self) -> Result<usize, GraphError> {
        let len = self.variables.len();
        let mut used = HashSet::new();
        for node in self.nodes.values() {
            for index in node.variable_indices() {
                if index < 0 || index as usize >= len {
                    return Err(GraphError::VariableOutOfRange {
                        variable: index,
                        len,
                    });
                }
                used.insert(VariableId::from_raw(index as u32));
            }
        }

        let remap = self.variables.retain(|id, _| used.contains(&id));
        let removed = len - self.variables.len();
        if removed == 0 {
            return Ok(0);
        }
        for node in self.nodes.values_mut() {
            node.remap_variables(|index| {
                remap
                    .get(index as usize)
                    .copied()
                    .flatten()
                    .map_or(index, |id| id.as_raw() as i32)
            });
        }
        debug!(removed, remaining = self.variables.len(), "compacted variable table");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Op;
    use weave_common::Value;

    #[test]
    fn producers_move_before_consumers() {
        let mut store = GraphStore::new();
        let mul = store.create_node(Op::Mul);
        let add = store.create_node(Op::Add);
        let x = store.create_node(Op::Random);
        store.connect_value(mul, "a", add, "value");
        store.connect_value(add, "a", x, "value");

        assert!(store.sort_topologically().unwrap());
        let ops: Vec<_> = store.nodes.values().map(|n| n.op.clone()).collect();
        assert_eq!(ops, vec![Op::Random, Op::Add, Op::Mul]);
        assert!(store.node(NodeId::from_raw(1)).values["a"].reads(NodeId::from_raw(0), "value"));
        assert!(store.node(NodeId::from_raw(2)).values["a"].reads(NodeId::from_raw(1), "value"));
    }

    #[test]
    fn sorted_graph_is_left_alone() {
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        let start = store.create_node(Op::OnStart);
        let add = store.create_node(Op::Add);
        store.connect_value(add, "a", x, "value");
        let before = store.clone();
        assert!(!store.sort_topologically().unwrap());
        assert_eq!(store, before);
        assert_eq!(store.node(start).op, Op::OnStart);
    }

    #[test]
    fn flow_edges_are_remapped() {
        let mut store = GraphStore::new();
        let set = store.create_node(Op::VariableSet);
        let x = store.create_node(Op::Random);
        let start = store.create_node(Op::OnStart);
        store.connect_value(set, "0", x, "value");
        store.connect_flow(start, "out", set, "in");
        assert!(store.sort_topologically().unwrap());
        // x, set, start
        let flows = &store.node(NodeId::from_raw(2)).flows;
        assert_eq!(flows["out"].as_ref().map(|t| t.node), Some(NodeId::from_raw(1)));
    }

    #[test]
    fn value_cycle_is_an_error() {
        let mut store = GraphStore::new();
        let a = store.create_node(Op::Add);
        let b = store.create_node(Op::Add);
        store.connect_value(a, "a", b, "value");
        store.connect_value(b, "a", a, "value");
        assert!(matches!(
            store.sort_topologically(),
            Err(GraphError::ValueCycle { .. })
        ));
    }

    #[test]
    fn unconnected_nodes_are_swept() {
        let mut store = GraphStore::new();
        let lonely = store.create_node(Op::Random);
        let start = store.create_node(Op::OnStart);
        let log = store.create_node(Op::Other("debug/log".into()));
        store.connect_flow(start, "out", log, "in");
        store.set_value(lonely, "min", Value::Float(0.0));

        assert_eq!(store.remove_unconnected_nodes().unwrap(), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.node(NodeId::from_raw(0)).op, Op::OnStart);
        assert_eq!(
            store.node(NodeId::from_raw(0)).flows["out"].as_ref().map(|t| t.node),
            Some(NodeId::from_raw(1))
        );
    }

    #[test]
    fn unreferenced_variables_are_compacted() {
        let mut store = GraphStore::new();
        store.add_variable("unused", Value::Int(0));
        store.add_variable("speed", Value::Float(2.0));
        let get = store.create_node(Op::VariableGet);
        store.set_configuration(get, "variable", Value::Int(1));

        assert_eq!(store.compact_variables().unwrap(), 1);
        assert_eq!(store.variables.len(), 1);
        assert_eq!(store.node(get).config_int("variable"), Some(0));
        assert_eq!(store.variables[VariableId::from_raw(0)].name, "speed");
    }

    #[test]
    fn compaction_rejects_bad_indices() {
        let mut store = GraphStore::new();
        let set = store.create_node(Op::VariableSet);
        store.set_configuration(set, "variables", Value::IntArray(vec![3]));
        assert_eq!(
            store.compact_variables(),
            Err(GraphError::VariableOutOfRange { variable: 3, len: 0 })
        );
    }
}
