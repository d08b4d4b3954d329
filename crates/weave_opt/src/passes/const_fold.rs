//! Constant folding and algebraic simplification of math nodes.

use super::fold::evaluate;
use crate::pass::CleanupPass;
use crate::session::CleanupSession;
use tracing::trace;
use weave_common::Value;
use weave_graph::{GraphError, NodeId, Op};

/// The single output socket of math ops.
const OUT: &str = "value";

/// Folds math nodes with all-literal inputs and removes identity operations.
///
/// Three rewrites, in order:
/// 1. A node whose inputs are all literal and whose op/operand shapes are in
///    the fold table is replaced by its result at every consumer.
/// 2. `x + 0`, `0 + x`, `x - 0`, `x * 1`, `1 * x` and `x / 1` with `x`
///    connected are bypassed to `x`.
/// 3. `(x * c) * c` where every component of `c` is `±1` is bypassed to `x`
///    when the inner product feeds nothing else.
pub struct ConstFoldPass;

impl CleanupPass for ConstFoldPass {
    fn name(&self) -> &'static str {
        "const-fold"
    }

    fn description(&self) -> &'static str {
        "Evaluates math on literals and removes identity operations"
    }

    fn run(&self, session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
        fold_literals(session);
        remove_identities(session)?;
        cancel_sign_flips(session)?;
        Ok(())
    }
}

fn fold_literals(session: &mut CleanupSession<'_>) {
    // index order, so a fold that makes a later node all-literal is seen in the same run
    for id in session.live_nodes() {
        let node = session.node(id);
        if !node.flows.is_empty() || !node.input_flows.is_empty() {
            continue;
        }
        let Some(result) = evaluate(&node.op, &node.values) else {
            continue;
        };
        if !session.only_read_through(id, OUT) {
            continue;
        }
        trace!(node = %id, op = %node.op, %result, "folded to literal");
        session.replace_output_with_literal(id, OUT, result);
        session.remove_node(id);
    }
}

/// The operand a node reduces to when `identity` holds for the other operand.
fn identity_operand(
    session: &CleanupSession<'_>,
    id: NodeId,
    identity: fn(&Value) -> bool,
    commutative: bool,
) -> Option<&'static str> {
    let values = &session.node(id).values;
    if values.len() != 2 {
        return None;
    }
    let (a, b) = (values.get("a")?, values.get("b")?);
    if b.literal().is_some_and(identity) && a.connection().is_some() {
        return Some("a");
    }
    if commutative && a.literal().is_some_and(identity) && b.connection().is_some() {
        return Some("b");
    }
    None
}

fn remove_identities(session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
    let rules: [(Op, fn(&Value) -> bool, bool); 4] = [
        (Op::Add, Value::is_zero, true),
        (Op::Mul, Value::is_one, true),
        (Op::Sub, Value::is_zero, false),
        (Op::Div, Value::is_one, false),
    ];
    for (op, identity, commutative) in rules {
        for id in session.live_nodes_where(|n| n.op == op) {
            let Some(operand) = identity_operand(session, id, identity, commutative) else {
                continue;
            };
            if !session.only_read_through(id, OUT) {
                continue;
            }
            trace!(node = %id, %op, operand, "removed identity operation");
            session.by_pass_value(id, operand, OUT)?;
            session.remove_node(id);
        }
    }
    Ok(())
}

/// Splits a two-operand node into (connected operand name, literal operand).
fn connected_and_literal<'s>(
    session: &'s CleanupSession<'_>,
    id: NodeId,
) -> Vec<(&'static str, NodeId, &'s str, &'s Value)> {
    let values = &session.node(id).values;
    let mut found = Vec::new();
    if values.len() != 2 {
        return found;
    }
    for (x, c) in [("a", "b"), ("b", "a")] {
        if let (Some(xs), Some(cs)) = (values.get(x), values.get(c)) {
            if let (Some(r), Some(lit)) = (xs.connection(), cs.literal()) {
                found.push((x, r.node, r.socket.as_str(), lit));
            }
        }
    }
    found
}

fn cancel_sign_flips(session: &mut CleanupSession<'_>) -> Result<(), GraphError> {
    for outer in session.live_nodes_where(|n| n.op == Op::Mul) {
        if session.is_removed(outer) {
            continue;
        }
        let candidate = connected_and_literal(session, outer)
            .into_iter()
            .find_map(|(_, inner, socket, d)| {
                if socket != OUT
                    || inner == outer
                    || session.is_removed(inner)
                    || session.node(inner).op != Op::Mul
                    || !d.is_unit_magnitude()
                {
                    return None;
                }
                connected_and_literal(session, inner)
                    .into_iter()
                    .find(|(_, _, _, c)| *c == d)
                    .map(|(x, _, _, _)| (inner, x))
            });
        let Some((inner, x)) = candidate else {
            continue;
        };
        let inner_feeds_only_outer = session
            .uses_of(inner)
            .iter()
            .all(|u| u.consumer == outer && u.output == OUT);
        if !inner_feeds_only_outer || !session.only_read_through(outer, OUT) {
            continue;
        }
        trace!(outer = %outer, inner = %inner, "cancelled paired sign flip");
        session.by_pass_value_from(inner, x, outer, OUT)?;
        session.remove_node(outer);
        session.remove_node(inner);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::run_once;
    use weave_common::ValueType;
    use weave_graph::{GraphStore, ValueSource};

    fn sink(store: &mut GraphStore, source: NodeId) -> NodeId {
        let log = store.create_node(Op::Other("debug/log".into()));
        store.connect_value(log, "message", source, OUT);
        log
    }

    #[test]
    fn folds_literal_addition_at_every_consumer() {
        let mut store = GraphStore::new();
        let add = store.create_node(Op::Add);
        store.set_value(add, "a", Value::Float(2.0));
        store.set_value(add, "b", Value::Float(3.0));
        sink(&mut store, add);
        sink(&mut store, add);

        assert!(run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 2);
        for node in store.nodes.values() {
            assert_eq!(node.values["message"], ValueSource::Literal(Value::Float(5.0)));
        }
    }

    #[test]
    fn folds_chains_in_one_run() {
        let mut store = GraphStore::new();
        let combine = store.create_node(Op::Combine2);
        store.set_value(combine, "a", Value::Float(3.0));
        store.set_value(combine, "b", Value::Float(4.0));
        let length = store.create_node(Op::Length);
        store.connect_value(length, "a", combine, OUT);
        sink(&mut store, length);

        assert!(run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.node(NodeId::from_raw(0)).values["message"],
            ValueSource::Literal(Value::Float(5.0))
        );
    }

    #[test]
    fn unmatched_shapes_are_left_alone() {
        let mut store = GraphStore::new();
        let div = store.create_node(Op::Div);
        store.set_value(div, "a", Value::Int(4));
        store.set_value(div, "b", Value::Int(2));
        sink(&mut store, div);
        assert!(!run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn other_output_readers_block_folding() {
        let mut store = GraphStore::new();
        let add = store.create_node(Op::Add);
        store.set_value(add, "a", Value::Float(1.0));
        store.set_value(add, "b", Value::Float(1.0));
        let log = store.create_node(Op::Other("debug/log".into()));
        store.connect_value(log, "message", add, "isValid");
        assert!(!run_once(&ConstFoldPass, &mut store));
    }

    #[test]
    fn add_zero_is_bypassed() {
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        let add = store.create_node(Op::Add);
        store.set_value(add, "a", Value::Float3([0.0; 3]));
        store.connect_value(add, "b", x, OUT);
        let log = sink(&mut store, add);

        assert!(run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 2);
        let log = NodeId::from_raw(log.as_raw() - 1);
        assert!(store.node(log).values["message"].reads(x, OUT));
    }

    #[test]
    fn sub_zero_only_on_right() {
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        let sub = store.create_node(Op::Sub);
        store.set_value(sub, "a", Value::Float(0.0));
        store.connect_value(sub, "b", x, OUT);
        sink(&mut store, sub);
        assert!(!run_once(&ConstFoldPass, &mut store));

        store.connect_value(sub, "a", x, OUT);
        store.set_value(sub, "b", Value::Float(0.0));
        assert!(run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn mul_one_and_div_one_are_bypassed() {
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        let mul = store.create_node(Op::Mul);
        store.connect_value(mul, "a", x, OUT);
        store.set_value(mul, "b", Value::Float(1.0));
        let div = store.create_node(Op::Div);
        store.connect_value(div, "a", mul, OUT);
        store.set_value(div, "b", Value::Float(1.0));
        sink(&mut store, div);

        assert!(run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 2);
        assert!(store.node(NodeId::from_raw(1)).values["message"].reads(x, OUT));
    }

    fn sign_flip_graph() -> (GraphStore, NodeId, NodeId, NodeId) {
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        store.node_mut(x).outputs.insert(OUT.into(), ValueType::Float3);
        let inner = store.create_node(Op::Mul);
        store.connect_value(inner, "a", x, OUT);
        store.set_value(inner, "b", Value::Float3([1.0, 1.0, -1.0]));
        let outer = store.create_node(Op::Mul);
        store.set_value(outer, "a", Value::Float3([1.0, 1.0, -1.0]));
        store.connect_value(outer, "b", inner, OUT);
        (store, x, inner, outer)
    }

    #[test]
    fn paired_sign_flips_cancel() {
        let (mut store, x, _, outer) = sign_flip_graph();
        sink(&mut store, outer);
        sink(&mut store, outer);
        assert!(run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 3);
        for id in [NodeId::from_raw(1), NodeId::from_raw(2)] {
            assert!(store.node(id).values["message"].reads(x, OUT));
        }
    }

    #[test]
    fn shared_inner_flip_is_kept() {
        let (mut store, _, inner, outer) = sign_flip_graph();
        sink(&mut store, outer);
        sink(&mut store, inner);
        assert!(!run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn unequal_flips_are_kept() {
        let (mut store, _, _, outer) = sign_flip_graph();
        store.set_value(outer, "a", Value::Float3([1.0, -1.0, 1.0]));
        sink(&mut store, outer);
        assert!(!run_once(&ConstFoldPass, &mut store));
    }

    #[test]
    fn int_min_multiplier_is_left_alone() {
        let mut store = GraphStore::new();
        let x = store.create_node(Op::Random);
        store.node_mut(x).outputs.insert(OUT.into(), ValueType::Int);
        let inner = store.create_node(Op::Mul);
        store.connect_value(inner, "a", x, OUT);
        store.set_value(inner, "b", Value::Int(3));
        let outer = store.create_node(Op::Mul);
        store.connect_value(outer, "a", inner, OUT);
        store.set_value(outer, "b", Value::Int(i32::MIN));
        sink(&mut store, outer);

        assert!(!run_once(&ConstFoldPass, &mut store));
        assert_eq!(store.len(), 4);
    }
}
