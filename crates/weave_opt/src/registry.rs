//! Pass registration and the cleanup driver.

use crate::pass::CleanupPass;
use crate::passes::register_builtin_passes;
use crate::session::CleanupSession;
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;
use weave_graph::{GraphError, GraphStore};

/// What a [`CleanupRegistry::run_to_fixpoint`] call did.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct CleanupStats {
    /// Cleanup cycles run, including the final unchanged one.
    pub iterations: u32,
    /// Node count before the first cycle.
    pub nodes_before: usize,
    /// Node count after the last cycle.
    pub nodes_after: usize,
    /// Number of modifying calls each pass made, in registration order.
    pub pass_changes: IndexMap<&'static str, usize>,
    /// `true` if the last cycle changed nothing.
    pub converged: bool,
}

impl CleanupStats {
    /// Nodes removed over the whole run (net of nodes added).
    pub fn nodes_removed(&self) -> usize {
        self.nodes_before.saturating_sub(self.nodes_after)
    }
}

/// An ordered, append-only list of cleanup passes.
///
/// The registry runs each enabled pass once per cycle, in registration
/// order. Disabled passes stay registered but are skipped.
#[derive(Default)]
pub struct CleanupRegistry {
    passes: Vec<Box<dyn CleanupPass>>,
    disabled: HashSet<String>,
}

impl CleanupRegistry {
    /// Creates a registry with no passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every builtin pass in its standard order.
    pub fn with_builtin_passes() -> Self {
        let mut registry = Self::new();
        register_builtin_passes(&mut registry);
        registry
    }

    /// Appends a pass.
    pub fn register_cleanup(&mut self, pass: Box<dyn CleanupPass>) {
        self.passes.push(pass);
    }

    /// Skips the pass named `name` in future runs.
    ///
    /// Returns `false` if no registered pass has that name.
    pub fn disable(&mut self, name: &str) -> bool {
        let known = self.passes.iter().any(|p| p.name() == name);
        if known {
            self.disabled.insert(name.to_string());
        }
        known
    }

    /// Returns `true` if `name` is registered and not disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.contains(name) && self.passes.iter().any(|p| p.name() == name)
    }

    /// Iterates over all registered passes in order.
    pub fn passes(&self) -> impl Iterator<Item = &dyn CleanupPass> {
        self.passes.iter().map(|p| p.as_ref())
    }

    /// Returns the number of registered passes.
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Runs one cleanup cycle: each enabled pass once, in order.
    ///
    /// Returns `true` if any pass changed the graph.
    pub fn start_cleanup(&self, store: &mut GraphStore) -> Result<bool, GraphError> {
        let mut stats = CleanupStats::default();
        self.run_cycle(store, &mut stats)
    }

    fn run_cycle(&self, store: &mut GraphStore, stats: &mut CleanupStats) -> Result<bool, GraphError> {
        let mut any_change = false;
        for pass in &self.passes {
            if self.disabled.contains(pass.name()) {
                continue;
            }
            let mut session = CleanupSession::new(store);
            pass.run(&mut session)?;
            let changes = session.change_count();
            session.finish()?;
            if changes > 0 {
                debug!(pass = pass.name(), changes, nodes = store.len(), "pass changed graph");
                *stats.pass_changes.entry(pass.name()).or_default() += changes;
                any_change = true;
            }
        }
        Ok(any_change)
    }

    /// Runs cleanup cycles until one changes nothing or `max_iterations` cycles have run.
    pub fn run_to_fixpoint(
        &self,
        store: &mut GraphStore,
        max_iterations: u32,
    ) -> Result<CleanupStats, GraphError> {
        let mut stats = CleanupStats {
            nodes_before: store.len(),
            ..CleanupStats::default()
        };
        for pass in self.passes() {
            if !self.disabled.contains(pass.name()) {
                stats.pass_changes.insert(pass.name(), 0);
            }
        }
        while stats.iterations < max_iterations {
            stats.iterations += 1;
            if !self.run_cycle(store, &mut stats)? {
                stats.converged = true;
                break;
            }
        }
        stats.nodes_after = store.len();
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_common::Value;
    use weave_graph::{NodeId, Op};

    /// Removes one unconsumed `math/random` node per run.
    struct RemoveOneRandom;

    impl CleanupPass for RemoveOneRandom {
        fn name(&self) -> &'static str {
            "remove-one-random"
        }

        fn description(&self) -> &'static str {
            "test pass"
        }

        fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
            if let Some(&id) = session.live_nodes_where(|n| n.op == Op::Random).first() {
                session.remove_node(id);
            }
            Ok(())
        }
    }

    fn randoms(count: usize) -> GraphStore {
        let mut store = GraphStore::new();
        for _ in 0..count {
            store.create_node(Op::Random);
        }
        store
    }

    #[test]
    fn builtin_passes_in_order() {
        let registry = CleanupRegistry::with_builtin_passes();
        let names: Vec<_> = registry.passes().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "const-fold",
                "cse",
                "pointer-get-dedup",
                "decompose-dedup",
                "variable-get-dedup",
                "tick-dedup",
                "event-fan-in",
                "sequence-collapse",
                "wait-all-collapse",
                "dead-variable",
                "conversion-cancel",
            ]
        );
        assert!(registry.passes().all(|p| !p.description().is_empty()));
    }

    #[test]
    fn start_cleanup_reports_change() {
        let mut registry = CleanupRegistry::new();
        registry.register_cleanup(Box::new(RemoveOneRandom));
        let mut store = randoms(2);
        assert!(registry.start_cleanup(&mut store).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn fixpoint_runs_until_stable() {
        let mut registry = CleanupRegistry::new();
        registry.register_cleanup(Box::new(RemoveOneRandom));
        let mut store = randoms(3);
        let stats = registry.run_to_fixpoint(&mut store, 10).unwrap();
        assert!(stats.converged);
        assert_eq!(stats.iterations, 4);
        assert_eq!(stats.nodes_removed(), 3);
        assert_eq!(stats.pass_changes["remove-one-random"], 3);
    }

    #[test]
    fn fixpoint_respects_cap() {
        let mut registry = CleanupRegistry::new();
        registry.register_cleanup(Box::new(RemoveOneRandom));
        let mut store = randoms(5);
        let stats = registry.run_to_fixpoint(&mut store, 2).unwrap();
        assert!(!stats.converged);
        assert_eq!(stats.iterations, 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn disabled_pass_is_skipped() {
        let mut registry = CleanupRegistry::new();
        registry.register_cleanup(Box::new(RemoveOneRandom));
        assert!(registry.disable("remove-one-random"));
        assert!(!registry.disable("no-such-pass"));
        assert!(!registry.is_enabled("remove-one-random"));
        let mut store = randoms(1);
        assert!(!registry.start_cleanup(&mut store).unwrap());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pass_errors_propagate() {
        struct Broken;
        impl CleanupPass for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn description(&self) -> &'static str {
                "removes a consumed node"
            }
            fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
                session.remove_node(NodeId::from_raw(0));
                Ok(())
            }
        }

        let mut registry = CleanupRegistry::new();
        registry.register_cleanup(Box::new(Broken));
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        let neg = store.create_node(Op::Neg);
        store.connect_value(neg, "a", x, "value");
        store.set_value(x, "seed", Value::Int(1));
        assert!(matches!(
            registry.start_cleanup(&mut store),
            Err(GraphError::DanglingReference { .. })
        ));
    }
}
