//! One pass invocation's exclusive view of the graph.

use std::collections::HashSet;
use tracing::trace;
use weave_common::Value;
use weave_graph::{FlowTarget, FlowUse, GraphError, GraphStore, Node, NodeId, ValueUse};

/// Wraps a [`GraphStore`] for the duration of one pass run.
///
/// Removals are deferred: [`remove_node`](Self::remove_node) only marks the
/// node, so indices stay stable while the pass iterates. Passes must skip
/// marked nodes (see [`is_removed`](Self::is_removed)) and must rewire every
/// consumer of a node before marking it. [`finish`](Self::finish) compacts
/// the node list in one sweep.
pub struct CleanupSession<'a> {
    store: &'a mut GraphStore,
    removed: HashSet<NodeId>,
    changes: usize,
}

impl<'a> CleanupSession<'a> {
    /// Starts a session over `store`.
    pub fn new(store: &'a mut GraphStore) -> Self {
        Self {
            store,
            removed: HashSet::new(),
            changes: 0,
        }
    }

    /// Read access to the underlying graph, including marked nodes.
    pub fn store(&self) -> &GraphStore {
        &*self.store
    }

    /// Returns the node at `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    pub fn node(&self, id: NodeId) -> &Node {
        self.store.node(id)
    }

    /// Snapshot of the IDs of all nodes not marked for removal.
    pub fn live_nodes(&self) -> Vec<NodeId> {
        self.store
            .nodes
            .ids()
            .filter(|id| !self.removed.contains(id))
            .collect()
    }

    /// Snapshot of the live nodes satisfying `pred`.
    pub fn live_nodes_where(&self, pred: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.store
            .nodes
            .iter()
            .filter(|(id, node)| !self.removed.contains(id) && pred(node))
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns `true` if `id` was marked for removal in this session.
    pub fn is_removed(&self, id: NodeId) -> bool {
        self.removed.contains(&id)
    }

    /// Returns `true` once any call has modified the graph.
    pub fn has_changes(&self) -> bool {
        self.changes > 0
    }

    /// Number of modifying calls made so far.
    pub fn change_count(&self) -> usize {
        self.changes
    }

    fn record(&mut self, changed: bool) -> bool {
        if changed {
            self.changes += 1;
        }
        changed
    }

    /// Value edges reading `producer`, ignoring consumers marked for removal.
    pub fn uses_of(&self, producer: NodeId) -> Vec<ValueUse> {
        self.store
            .uses_of(producer)
            .into_iter()
            .filter(|u| !self.removed.contains(&u.consumer))
            .collect()
    }

    /// Flow edges entering `target`, ignoring sources marked for removal.
    pub fn flows_into(&self, target: NodeId) -> Vec<FlowUse> {
        self.store
            .flows_into(target)
            .into_iter()
            .filter(|u| !self.removed.contains(&u.source))
            .collect()
    }

    /// Returns `true` if every live reader of `producer` reads its `socket` output.
    pub fn only_read_through(&self, producer: NodeId, socket: &str) -> bool {
        self.uses_of(producer).iter().all(|u| u.output == socket)
    }

    /// Marks `id` for removal at the end of the session.
    pub fn remove_node(&mut self, id: NodeId) {
        if self.removed.insert(id) {
            trace!(node = %id, op = %self.store.node(id).op, "removing node");
            self.record(true);
        }
    }

    /// Appends a new node and returns its index.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.store.add_node(node);
        trace!(node = %id, op = %self.store.node(id).op, "added node");
        self.record(true);
        id
    }

    /// Connects `from.flows[flow_out]` to `(to, flow_in)`.
    pub fn connect_flow(&mut self, from: NodeId, flow_out: &str, to: NodeId, flow_in: &str) {
        let current = self.store.node(from).flows.get(flow_out).cloned().flatten();
        if current.as_ref() != Some(&FlowTarget::new(to, flow_in)) {
            self.store.connect_flow(from, flow_out, to, flow_in);
            self.record(true);
        }
    }

    /// Deletes the output flow slot `socket` of `node`, keeping the order of the rest.
    pub fn remove_flow_output(&mut self, node: NodeId, socket: &str) -> bool {
        let changed = self
            .store
            .node_mut(node)
            .flows
            .shift_remove(socket)
            .is_some();
        self.record(changed)
    }

    /// See [`GraphStore::by_pass_flow`].
    pub fn by_pass_flow(&mut self, node: NodeId, flow_in: &str, flow_out: &str) -> bool {
        let changed = self.store.by_pass_flow(node, flow_in, flow_out);
        self.record(changed)
    }

    /// See [`GraphStore::redirect_flow_input`].
    pub fn redirect_flow_input(
        &mut self,
        node: NodeId,
        flow_in: &str,
        target: Option<FlowTarget>,
    ) -> bool {
        let changed = self.store.redirect_flow_input(node, flow_in, target);
        self.record(changed)
    }

    /// See [`GraphStore::by_pass_value`].
    pub fn by_pass_value(
        &mut self,
        node: NodeId,
        value_in: &str,
        value_out: &str,
    ) -> Result<bool, GraphError> {
        let changed = self.store.by_pass_value(node, value_in, value_out)?;
        Ok(self.record(changed))
    }

    /// See [`GraphStore::by_pass_value_from`].
    pub fn by_pass_value_from(
        &mut self,
        source: NodeId,
        value_in: &str,
        node: NodeId,
        value_out: &str,
    ) -> Result<bool, GraphError> {
        let changed = self
            .store
            .by_pass_value_from(source, value_in, node, value_out)?;
        Ok(self.record(changed))
    }

    /// See [`GraphStore::replace_node_uses`].
    pub fn replace_node_uses(&mut self, old: NodeId, new: NodeId) -> bool {
        let changed = self.store.replace_node_uses(old, new);
        self.record(changed)
    }

    /// See [`GraphStore::replace_output_with_literal`].
    pub fn replace_output_with_literal(&mut self, node: NodeId, socket: &str, value: Value) -> bool {
        let changed = self.store.replace_output_with_literal(node, socket, value);
        self.record(changed)
    }

    /// Physically removes the marked nodes and reports whether anything changed.
    pub fn finish(self) -> Result<bool, GraphError> {
        self.store.remove_nodes(&self.removed)?;
        Ok(self.changes > 0)
    }
}
