//! Builtin cleanup passes.

mod const_fold;
mod conversion;
mod dead_variable;
mod dedup;
mod event_fan_in;
mod flow;
mod fold;

pub use const_fold::ConstFoldPass;
pub use conversion::ConversionCancelPass;
pub use dead_variable::DeadVariablePass;
pub use dedup::{
    CsePass, DecomposeDedupPass, PointerGetDedupPass, TickDedupPass, VariableGetDedupPass,
};
pub use event_fan_in::EventFanInPass;
pub use flow::{SequenceCollapsePass, WaitAllCollapsePass};

use crate::registry::CleanupRegistry;

/// Registers all builtin passes in their standard order.
///
/// Folding runs first so that deduplication sees literal inputs; control-flow
/// collapsing runs after fan-in so freshly built sequences are collapsed in
/// the same cycle.
pub fn register_builtin_passes(registry: &mut CleanupRegistry) {
    registry.register_cleanup(Box::new(ConstFoldPass));
    registry.register_cleanup(Box::new(CsePass));
    registry.register_cleanup(Box::new(PointerGetDedupPass));
    registry.register_cleanup(Box::new(DecomposeDedupPass));
    registry.register_cleanup(Box::new(VariableGetDedupPass));
    registry.register_cleanup(Box::new(TickDedupPass));
    registry.register_cleanup(Box::new(EventFanInPass));
    registry.register_cleanup(Box::new(SequenceCollapsePass));
    registry.register_cleanup(Box::new(WaitAllCollapsePass));
    registry.register_cleanup(Box::new(DeadVariablePass));
    registry.register_cleanup(Box::new(ConversionCancelPass));
}

#[cfg(test)]
pub(crate) fn run_once(pass: &dyn crate::pass::CleanupPass, store: &mut weave_graph::GraphStore) -> bool {
    let mut session = crate::session::CleanupSession::new(store);
    pass.run(&mut session).unwrap();
    session.finish().unwrap()
}
