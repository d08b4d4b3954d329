//! Errors raised by graph mutation and ordering.

use crate::ids::NodeId;

/// A structural error in a behavior graph.
///
/// These indicate a broken precondition: an exporter produced a malformed
/// graph or a rewrite forgot to rewire consumers before removing a node.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
pub enum GraphError {
    /// A surviving node still references a node scheduled for removal.
    #[error("node #{node} still references removed node #{target}")]
    DanglingReference {
        /// The referencing node.
        node: NodeId,
        /// The removed node.
        target: NodeId,
    },
    /// A node index is past the end of the node list.
    #[error("node #{node} is out of range (graph has {len} nodes)")]
    NodeOutOfRange {
        /// The offending index.
        node: NodeId,
        /// The number of nodes.
        len: usize,
    },
    /// A variable index is past the end of the variable table.
    #[error("variable #{variable} is out of range (graph has {len} variables)")]
    VariableOutOfRange {
        /// The offending index.
        variable: i32,
        /// The number of variables.
        len: usize,
    },
    /// Value edges form a cycle, so no producer-first ordering exists.
    #[error("value edges form a cycle through node #{node}")]
    ValueCycle {
        /// A node on the cycle.
        node: NodeId,
    },
    /// A named socket does not exist on a node.
    #[error("node #{node} has no socket `{socket}`")]
    MissingSocket {
        /// The node.
        node: NodeId,
        /// The socket name.
        socket: String,
    },
}
