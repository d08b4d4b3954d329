//! Compile-time evaluation of math ops over literal operands.

use indexmap::IndexMap;
use weave_common::Value;
use weave_graph::{Op, ValueSource};

/// Operand sockets, in positional order.
const OPERANDS: [&str; 4] = ["a", "b", "c", "d"];

/// Evaluates `op` over the node's value inputs.
///
/// Returns `None` unless the inputs are exactly `a`, `b`, ... up to the
/// node's input count, all literal, and the op/operand shapes are in the
/// table. Unmatched shapes are left to run at runtime.
pub(crate) fn evaluate(op: &Op, values: &IndexMap<String, ValueSource>) -> Option<Value> {
    if values.is_empty() || values.len() > OPERANDS.len() {
        return None;
    }
    let mut args = Vec::with_capacity(values.len());
    for name in &OPERANDS[..values.len()] {
        args.push(values.get(*name)?.literal()?);
    }

    use Value::*;
    match (op, args.as_slice()) {
        (Op::Add, [Int(a), Int(b)]) => Some(Int(a.wrapping_add(*b))),
        (Op::Sub, [Int(a), Int(b)]) => Some(Int(a.wrapping_sub(*b))),
        (Op::Mul, [Int(a), Int(b)]) => Some(Int(a.wrapping_mul(*b))),
        (Op::Neg, [Int(a)]) => Some(Int(a.wrapping_neg())),
        (Op::Abs, [Int(a)]) => Some(Int(a.wrapping_abs())),
        (Op::Min, [Int(a), Int(b)]) => Some(Int(*a.min(b))),
        (Op::Max, [Int(a), Int(b)]) => Some(Int(*a.max(b))),
        // integer division and remainder trap on zero; left to the runtime
        (Op::Div | Op::Rem, [Int(_), Int(_)]) => None,

        (Op::Add, [a, b]) => zip(a, b, |x, y| x + y),
        (Op::Sub, [a, b]) => zip(a, b, |x, y| x - y),
        (Op::Mul, [a, b]) => zip(a, b, |x, y| x * y),
        (Op::Div, [a, b]) => zip(a, b, |x, y| x / y),
        (Op::Min, [a, b]) => zip(a, b, f32::min),
        (Op::Max, [a, b]) => zip(a, b, f32::max),
        (Op::Pow, [a, b]) => zip(a, b, f32::powf),
        (Op::Atan2, [a, b]) => zip(a, b, f32::atan2),

        (Op::Neg, [a]) => map(a, |x| -x),
        (Op::Abs, [a]) => map(a, f32::abs),
        (Op::Saturate, [a]) => map(a, |x| x.clamp(0.0, 1.0)),
        (Op::Deg, [a]) => map(a, f32::to_degrees),
        (Op::Rad, [a]) => map(a, f32::to_radians),
        (Op::Exp, [a]) => map(a, f32::exp),
        (Op::Log, [a]) => map(a, f32::ln),
        (Op::Sqrt, [a]) => map(a, f32::sqrt),
        (Op::Sin, [a]) => map(a, f32::sin),
        (Op::Cos, [a]) => map(a, f32::cos),
        (Op::Tan, [a]) => map(a, f32::tan),
        (Op::Asin, [a]) => map(a, f32::asin),
        (Op::Acos, [a]) => map(a, f32::acos),
        (Op::Atan, [a]) => map(a, f32::atan),

        (Op::Dot, [a, b]) if is_vector(a) => {
            let sum = zip_components(a, b)?.iter().map(|(x, y)| x * y).sum();
            Some(Float(sum))
        }
        (Op::Length, [a]) if is_vector(a) => {
            let squares: f32 = a.components()?.iter().map(|x| x * x).sum();
            Some(Float(squares.sqrt()))
        }

        (Op::Combine2, [Float(x), Float(y)]) => Some(Float2([*x, *y])),
        (Op::Combine3, [Float(x), Float(y), Float(z)]) => Some(Float3([*x, *y, *z])),
        (Op::Combine4, [Float(x), Float(y), Float(z), Float(w)]) => {
            Some(Float4([*x, *y, *z, *w]))
        }

        _ => None,
    }
}

fn is_vector(value: &Value) -> bool {
    matches!(value, Value::Float2(_) | Value::Float3(_) | Value::Float4(_))
}

/// Pairs up the components of two float values of the same type.
fn zip_components(a: &Value, b: &Value) -> Option<Vec<(f32, f32)>> {
    if a.value_type() != b.value_type() {
        return None;
    }
    let (a, b) = (a.components()?, b.components()?);
    Some(a.iter().copied().zip(b.iter().copied()).collect())
}

fn zip(a: &Value, b: &Value, f: impl Fn(f32, f32) -> f32) -> Option<Value> {
    let pairs = zip_components(a, b)?;
    rebuild(a, pairs.into_iter().map(|(x, y)| f(x, y)).collect())
}

fn map(a: &Value, f: impl Fn(f32) -> f32) -> Option<Value> {
    rebuild(a, a.components()?.iter().map(|x| f(*x)).collect())
}

/// Builds a value of `template`'s type from its new components.
fn rebuild(template: &Value, components: Vec<f32>) -> Option<Value> {
    Some(match template {
        Value::Float(_) => Value::Float(*components.first()?),
        Value::Float2(_) => Value::Float2(components.try_into().ok()?),
        Value::Float3(_) => Value::Float3(components.try_into().ok()?),
        Value::Float4(_) => Value::Float4(components.try_into().ok()?),
        Value::Float4x4(_) => Value::Float4x4(components.try_into().ok()?),
        _ => return None,
    })
}
