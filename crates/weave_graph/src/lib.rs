//! Behavior-graph intermediate representation.
//!
//! A [`GraphStore`] holds an index-addressed list of operation [`Node`]s
//! connected by value edges (an input reading another node's output socket)
//! and flow edges (an output flow continuing into another node's input flow),
//! plus the graph's variable table.
//!
//! Exporters populate the store through the builder methods
//! ([`GraphStore::create_node`], [`GraphStore::connect_value`], ...). The
//! optimizer rewrites it through the mutation primitives
//! ([`GraphStore::by_pass_value`], [`GraphStore::remove_nodes`], ...), which
//! keep node indices dense: removing a node renumbers every later node and
//! every edge that points past it.

#![warn(missing_docs)]

pub mod arena;
pub mod error;
pub mod ids;
mod mutate;
pub mod node;
pub mod op;
mod order;
pub mod store;
pub mod validate;

pub use arena::{Arena, ArenaId};
pub use error::GraphError;
pub use ids::{NodeId, VariableId};
pub use node::{FlowTarget, Node, OutputRef, ValueSource};
pub use op::Op;
pub use store::{FlowUse, GraphStore, ValueUse, Variable};
