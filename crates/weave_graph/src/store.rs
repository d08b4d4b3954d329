//! The graph store: node list, variable table, and the builder interface
//! exporters use to populate them.

use crate::arena::Arena;
use crate::ids::{NodeId, VariableId};
use crate::node::{FlowTarget, Node, OutputRef, ValueSource};
use crate::op::Op;
use serde::{Deserialize, Serialize};
use weave_common::{ContentHash, Value, WeaveResult};

/// A graph-level variable with its initial value.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Variable {
    /// Display name.
    pub name: String,
    /// Initial (default) value, also the value seen by reads when nothing writes it.
    pub value: Value,
}

/// One value edge: `consumer.values[input]` reads `output` of some producer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ValueUse {
    /// The reading node.
    pub consumer: NodeId,
    /// The consumer's input socket.
    pub input: String,
    /// The producer's output socket being read.
    pub output: String,
}

/// One flow edge: `source.flows[flow_out]` continues into `flow_in` of some target.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FlowUse {
    /// The node the flow leaves.
    pub source: NodeId,
    /// The source's output flow socket.
    pub flow_out: String,
    /// The target's input flow socket.
    pub flow_in: String,
}

/// A behavior graph under construction or optimization.
///
/// A node's identity is its position in `nodes`. Every connected value input
/// and every flow target must address an existing node.
#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
pub struct GraphStore {
    /// Nodes in serialization order.
    pub nodes: Arena<NodeId, Node>,
    /// The variable table.
    #[serde(default)]
    pub variables: Arena<VariableId, Variable>,
}

impl GraphStore {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Returns the node at `id` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Appends a bare node of kind `op` and returns its index.
    pub fn create_node(&mut self, op: Op) -> NodeId {
        self.nodes.alloc(Node::new(op))
    }

    /// Appends a fully built node and returns its index.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.alloc(node)
    }

    /// Sets `node.values[socket]` to a literal.
    pub fn set_value(&mut self, node: NodeId, socket: impl Into<String>, value: Value) {
        self.nodes[node]
            .values
            .insert(socket.into(), ValueSource::Literal(value));
    }

    /// Connects `node.values[socket]` to `source_socket` on `source`.
    pub fn connect_value(
        &mut self,
        node: NodeId,
        socket: impl Into<String>,
        source: NodeId,
        source_socket: impl Into<String>,
    ) {
        self.nodes[node].values.insert(
            socket.into(),
            ValueSource::Connected(OutputRef::new(source, source_socket)),
        );
    }

    /// Connects output flow `flow_out` of `from` to input flow `flow_in` of `to`.
    ///
    /// The input flow socket is declared on `to` if it was not already.
    pub fn connect_flow(
        &mut self,
        from: NodeId,
        flow_out: impl Into<String>,
        to: NodeId,
        flow_in: impl Into<String>,
    ) {
        let flow_in = flow_in.into();
        let target = &mut self.nodes[to];
        if !target.input_flows.contains(&flow_in) {
            target.input_flows.push(flow_in.clone());
        }
        self.nodes[from]
            .flows
            .insert(flow_out.into(), Some(FlowTarget::new(to, flow_in)));
    }

    /// Sets a configuration entry on `node`.
    pub fn set_configuration(&mut self, node: NodeId, key: impl Into<String>, value: Value) {
        self.nodes[node].configuration.insert(key.into(), value);
    }

    /// Appends a variable and returns its index.
    pub fn add_variable(&mut self, name: impl Into<String>, value: Value) -> VariableId {
        self.variables.alloc(Variable {
            name: name.into(),
            value,
        })
    }

    /// Every value edge reading any output of `producer`, in consumer order.
    pub fn uses_of(&self, producer: NodeId) -> Vec<ValueUse> {
        let mut uses = Vec::new();
        for (consumer, node) in self.nodes.iter() {
            for (input, source) in &node.values {
                if let ValueSource::Connected(r) = source {
                    if r.node == producer {
                        uses.push(ValueUse {
                            consumer,
                            input: input.clone(),
                            output: r.socket.clone(),
                        });
                    }
                }
            }
        }
        uses
    }

    /// Every flow edge entering `target`, through any input flow, in source order.
    pub fn flows_into(&self, target: NodeId) -> Vec<FlowUse> {
        let mut uses = Vec::new();
        for (source, node) in self.nodes.iter() {
            for (flow_out, next) in &node.flows {
                if let Some(t) = next.as_ref().filter(|t| t.node == target) {
                    uses.push(FlowUse {
                        source,
                        flow_out: flow_out.clone(),
                        flow_in: t.socket.clone(),
                    });
                }
            }
        }
        uses
    }

    /// Hashes the JSON form of the graph.
    ///
    /// Equal graphs hash equally, so repeated exports can be compared cheaply.
    pub fn content_hash(&self) -> WeaveResult<ContentHash> {
        ContentHash::of_json(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_common::ValueType;

    fn add_chain() -> (GraphStore, NodeId, NodeId) {
        let mut store = GraphStore::new();
        let a = store.create_node(Op::Add);
        store.set_value(a, "a", Value::Float(1.0));
        store.set_value(a, "b", Value::Float(2.0));
        store.node_mut(a).outputs.insert("value".into(), ValueType::Float);
        let b = store.create_node(Op::Mul);
        store.connect_value(b, "a", a, "value");
        store.connect_value(b, "b", a, "value");
        (store, a, b)
    }

    #[test]
    fn builder_populates_nodes() {
        let (store, a, b) = add_chain();
        assert_eq!(store.len(), 2);
        assert_eq!(store.node(a).op, Op::Add);
        assert_eq!(
            store.node(b).values["a"],
            ValueSource::Connected(OutputRef::new(a, "value"))
        );
    }

    #[test]
    fn uses_lists_each_edge() {
        let (store, a, b) = add_chain();
        let uses = store.uses_of(a);
        assert_eq!(uses.len(), 2);
        assert!(uses.iter().all(|u| u.consumer == b && u.output == "value"));
        assert!(store.uses_of(b).is_empty());
    }

    #[test]
    fn connect_flow_declares_input() {
        let mut store = GraphStore::new();
        let tick = store.create_node(Op::OnTick);
        let log = store.create_node(Op::Other("debug/log".into()));
        store.connect_flow(tick, "out", log, "in");
        assert_eq!(store.node(log).input_flows, vec!["in".to_string()]);
        assert_eq!(
            store.flows_into(log),
            vec![FlowUse {
                source: tick,
                flow_out: "out".into(),
                flow_in: "in".into(),
            }]
        );
        assert!(store.flows_into(tick).is_empty());
    }

    #[test]
    fn variables_are_indexed() {
        let mut store = GraphStore::new();
        let v0 = store.add_variable("speed", Value::Float(1.0));
        let v1 = store.add_variable("enabled", Value::Bool(true));
        assert_eq!(v0.as_raw(), 0);
        assert_eq!(v1.as_raw(), 1);
        assert_eq!(store.variables[v1].value, Value::Bool(true));
    }

    #[test]
    fn content_hash_tracks_changes() {
        let (mut store, a, _) = add_chain();
        let before = store.content_hash().unwrap();
        assert_eq!(before, store.clone().content_hash().unwrap());
        store.set_value(a, "a", Value::Float(3.0));
        assert_ne!(before, store.content_hash().unwrap());
    }

    #[test]
    fn json_roundtrip() {
        let (mut store, _, _) = add_chain();
        store.add_variable("counter", Value::Int(0));
        let json = serde_json::to_string(&store).unwrap();
        let back: GraphStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }
}
