//! Cancellation of lossless type-conversion round trips.

use crate::pass::CleanupPass;
use crate::session::CleanupSession;
use tracing::trace;
use weave_graph::{GraphError, Op};

/// Returns `true` if converting with `inner` then `outer` gives back the input.
///
/// Only round trips through a wider type qualify; `float→int→float` loses the
/// fraction and `float→bool→float` loses the magnitude.
fn is_round_trip(inner: &Op, outer: &Op) -> bool {
    matches!(
        (inner, outer),
        (Op::BoolToFloat, Op::FloatToBool)
            | (Op::BoolToInt, Op::IntToBool)
            | (Op::IntToFloat, Op::FloatToInt)
    )
}

/// Removes `type/*` conversion pairs that undo each other.
///
/// Readers of the outer conversion are pointed at the inner conversion's
/// input. The inner conversion is removed as well once nothing else reads it.
pub struct ConversionCancelPass;

impl CleanupPass for ConversionCancelPass {
    fn name(&self) -> &'static str {
        "conversion-cancel"
    }

    fn description(&self) -> &'static str {
        "Cancels type conversions that round-trip to the original value"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        for outer in session.live_nodes_where(|n| n.op.is_conversion()) {
            if session.is_removed(outer) {
                continue;
            }
            let Some(source) = session
                .node(outer)
                .values
                .get("a")
                .and_then(|s| s.connection())
                .filter(|r| r.socket == "value")
                .cloned()
            else {
                continue;
            };
            let inner = source.node;
            if inner == outer
                || session.is_removed(inner)
                || !is_round_trip(&session.node(inner).op, &session.node(outer).op)
                || !session.only_read_through(outer, "value")
            {
                continue;
            }

            session.by_pass_value_from(inner, "a", outer, "value")?;
            session.remove_node(outer);
            trace!(inner = %inner, outer = %outer, "cancelled conversion round trip");
            if session.uses_of(inner).is_empty() {
                session.remove_node(inner);
            }
        }
        Ok(())
    }
}
