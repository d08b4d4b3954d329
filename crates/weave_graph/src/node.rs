//! Nodes, sockets, and edge endpoints.

use crate::ids::NodeId;
use crate::op::Op;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use weave_common::{Value, ValueType};

/// The output socket a value input reads from.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct OutputRef {
    /// The producing node.
    pub node: NodeId,
    /// The producer's output socket name.
    pub socket: String,
}

impl OutputRef {
    /// Creates a reference to `socket` on `node`.
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

/// The input flow socket an output flow continues into.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct FlowTarget {
    /// The node that continues execution.
    pub node: NodeId,
    /// Its input flow socket name.
    pub socket: String,
}

impl FlowTarget {
    /// Creates a flow target for `socket` on `node`.
    pub fn new(node: NodeId, socket: impl Into<String>) -> Self {
        Self {
            node,
            socket: socket.into(),
        }
    }
}

/// Where a value input gets its value from. Exactly one of the three.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    /// A constant.
    Literal(Value),
    /// Another node's output socket.
    Connected(OutputRef),
    /// Declared but neither set nor connected.
    #[default]
    Unset,
}

impl ValueSource {
    /// Returns the literal, if this input holds one.
    pub fn literal(&self) -> Option<&Value> {
        match self {
            ValueSource::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the upstream output, if this input is connected.
    pub fn connection(&self) -> Option<&OutputRef> {
        match self {
            ValueSource::Connected(output) => Some(output),
            _ => None,
        }
    }

    /// Returns `true` if this input reads `socket` of `node`.
    pub fn reads(&self, node: NodeId, socket: &str) -> bool {
        matches!(self, ValueSource::Connected(r) if r.node == node && r.socket == socket)
    }
}

/// An operation node of a behavior graph.
///
/// Maps are insertion-ordered; socket order is significant for serialization
/// and for how deduplication keys are formed.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    /// The operation this node performs.
    pub op: Op,
    /// Static parameters. Never changed by the optimizer.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub configuration: IndexMap<String, Value>,
    /// Input value sockets.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub values: IndexMap<String, ValueSource>,
    /// Declared output value sockets.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, ValueType>,
    /// Output flow sockets; `None` terminates execution on that path.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub flows: IndexMap<String, Option<FlowTarget>>,
    /// Declared input flow sockets.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input_flows: Vec<String>,
}

impl Node {
    /// Creates a node with the default input flows of `op` and nothing else.
    pub fn new(op: Op) -> Self {
        let input_flows = op
            .default_input_flows()
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self {
            op,
            configuration: IndexMap::new(),
            values: IndexMap::new(),
            outputs: IndexMap::new(),
            flows: IndexMap::new(),
            input_flows,
        }
    }

    /// Sets a literal value input.
    pub fn with_value(mut self, socket: impl Into<String>, value: Value) -> Self {
        self.values.insert(socket.into(), ValueSource::Literal(value));
        self
    }

    /// Connects a value input to an upstream output.
    pub fn with_input(
        mut self,
        socket: impl Into<String>,
        source: NodeId,
        source_socket: impl Into<String>,
    ) -> Self {
        self.values.insert(
            socket.into(),
            ValueSource::Connected(OutputRef::new(source, source_socket)),
        );
        self
    }

    /// Declares a value input without a source.
    pub fn with_unset(mut self, socket: impl Into<String>) -> Self {
        self.values.insert(socket.into(), ValueSource::Unset);
        self
    }

    /// Sets a configuration entry.
    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.configuration.insert(key.into(), value);
        self
    }

    /// Declares an output value socket.
    pub fn with_output(mut self, socket: impl Into<String>, ty: ValueType) -> Self {
        self.outputs.insert(socket.into(), ty);
        self
    }

    /// Declares an output flow socket, optionally connected.
    pub fn with_flow_out(mut self, socket: impl Into<String>, target: Option<FlowTarget>) -> Self {
        self.flows.insert(socket.into(), target);
        self
    }

    /// Declares an input flow socket.
    pub fn with_flow_in(mut self, socket: impl Into<String>) -> Self {
        let socket = socket.into();
        if !self.input_flows.contains(&socket) {
            self.input_flows.push(socket);
        }
        self
    }

    /// Returns the integer configuration entry `key`.
    pub fn config_int(&self, key: &str) -> Option<i32> {
        self.configuration.get(key).and_then(Value::as_int)
    }

    /// Returns `true` if every value input holds a literal.
    pub fn all_inputs_literal(&self) -> bool {
        self.values
            .values()
            .all(|source| matches!(source, ValueSource::Literal(_)))
    }

    /// Returns `true` if any value input is connected.
    pub fn has_connected_input(&self) -> bool {
        self.values.values().any(|source| source.connection().is_some())
    }

    /// Returns `true` if any output flow is connected.
    pub fn has_connected_flow(&self) -> bool {
        self.flows.values().any(Option::is_some)
    }

    /// Variable indices named by this node's configuration.
    ///
    /// Only variable ops carry variable references: `variable/get` and
    /// `variable/interpolate` under `variable`, the set ops under `variables`
    /// (or `variable` for older exporters).
    pub fn variable_indices(&self) -> Vec<i32> {
        if !self.op.references_variables() {
            return Vec::new();
        }
        let mut indices = Vec::new();
        if let Some(index) = self.config_int("variable") {
            indices.push(index);
        }
        if let Some(list) = self.configuration.get("variables").and_then(Value::as_int_array) {
            indices.extend_from_slice(list);
        }
        indices
    }

    /// Variable indices this node writes.
    pub fn written_variables(&self) -> Vec<i32> {
        if self.op.writes_variables() {
            self.variable_indices()
        } else {
            Vec::new()
        }
    }

    /// Rewrites every variable index in the configuration through `remap`.
    pub(crate) fn remap_variables(&mut self, remap: impl Fn(i32) -> i32) {
        if !self.op.references_variables() {
            return;
        }
        if let Some(Value::Int(index)) = self.configuration.get_mut("variable") {
            *index = remap(*index);
        }
        if let Some(Value::IntArray(list)) = self.configuration.get_mut("variables") {
            for index in list.iter_mut() {
                *index = remap(*index);
            }
        }
    }

    /// Nodes this node reads values from, one entry per connected input.
    pub fn value_dependencies(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.values
            .values()
            .filter_map(|source| source.connection().map(|r| r.node))
    }

    /// Nodes this node's flows continue into.
    pub fn flow_successors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.flows.values().flatten().map(|t| t.node)
    }

    /// Rewrites every node reference held by this node through `remap`.
    pub(crate) fn remap_nodes(&mut self, remap: impl Fn(NodeId) -> NodeId) {
        for source in self.values.values_mut() {
            if let ValueSource::Connected(r) = source {
                r.node = remap(r.node);
            }
        }
        for target in self.flows.values_mut().flatten() {
            target.node = remap(target.node);
        }
    }
}
