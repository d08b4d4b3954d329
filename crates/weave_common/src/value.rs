//! Literal values carried on graph sockets, configurations, and variables.
//!
//! A [`Value`] is one of the glTF behavior-graph value types. Equality and
//! hashing are bitwise on float components so that literals can key the
//! deduplication maps: `0.0` and `-0.0` are different literals, and a `NaN`
//! equals a `NaN` with the same bit pattern.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A literal value of one of the interchange format's value types.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// A signed 32-bit integer.
    Int(i32),
    /// A 32-bit float.
    Float(f32),
    /// A two-component float vector.
    Float2([f32; 2]),
    /// A three-component float vector.
    Float3([f32; 3]),
    /// A four-component float vector (also used for quaternions).
    Float4([f32; 4]),
    /// A column-major 4x4 float matrix.
    Float4x4([f32; 16]),
    /// A string, used by configurations such as pointer templates.
    String(String),
    /// An integer list, used by configurations such as variable index sets.
    IntArray(Vec<i32>),
}

/// The type signature of a [`Value`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `float2`
    Float2,
    /// `float3`
    Float3,
    /// `float4`
    Float4,
    /// `float4x4`
    Float4x4,
    /// `string`
    String,
    /// `int[]`
    IntArray,
}

impl ValueType {
    /// Returns the glTF type signature for this type.
    pub fn signature(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Float2 => "float2",
            ValueType::Float3 => "float3",
            ValueType::Float4 => "float4",
            ValueType::Float4x4 => "float4x4",
            ValueType::String => "string",
            ValueType::IntArray => "int[]",
        }
    }

    /// Returns the number of float components, or `None` for non-float types.
    pub fn component_count(self) -> Option<usize> {
        match self {
            ValueType::Float => Some(1),
            ValueType::Float2 => Some(2),
            ValueType::Float3 => Some(3),
            ValueType::Float4 => Some(4),
            ValueType::Float4x4 => Some(16),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

impl Value {
    /// Returns the type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Float2(_) => ValueType::Float2,
            Value::Float3(_) => ValueType::Float3,
            Value::Float4(_) => ValueType::Float4,
            Value::Float4x4(_) => ValueType::Float4x4,
            Value::String(_) => ValueType::String,
            Value::IntArray(_) => ValueType::IntArray,
        }
    }

    /// Returns the float components of a float-typed value.
    pub fn components(&self) -> Option<&[f32]> {
        match self {
            Value::Float(v) => Some(std::slice::from_ref(v)),
            Value::Float2(v) => Some(v),
            Value::Float3(v) => Some(v),
            Value::Float4(v) => Some(v),
            Value::Float4x4(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float if this is a `Float`.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the integer list if this is an `IntArray`.
    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            Value::IntArray(v) => Some(v),
            _ => None,
        }
    }

    /// Returns `true` if this is the additive identity of its type.
    ///
    /// Float vectors and matrices are zero when every component is zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(v) => *v == 0,
            _ => self
                .components()
                .is_some_and(|c| c.iter().all(|x| *x == 0.0)),
        }
    }

    /// Returns `true` if this is the component-wise multiplicative identity.
    pub fn is_one(&self) -> bool {
        match self {
            Value::Int(v) => *v == 1,
            _ => self
                .components()
                .is_some_and(|c| c.iter().all(|x| *x == 1.0)),
        }
    }

    /// Returns `true` if every component has unit magnitude (`+1` or `-1`).
    pub fn is_unit_magnitude(&self) -> bool {
        match self {
            Value::Int(v) => matches!(v, 1 | -1),
            _ => self
                .components()
                .is_some_and(|c| c.iter().all(|x| x.abs() == 1.0)),
        }
    }
}

fn bits_eq(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::IntArray(a), Value::IntArray(b)) => a == b,
            _ if self.value_type() == other.value_type() => {
                match (self.components(), other.components()) {
                    (Some(a), Some(b)) => bits_eq(a, b),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_type().hash(state);
        match self {
            Value::Bool(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::String(v) => v.hash(state),
            Value::IntArray(v) => v.hash(state),
            _ => {
                if let Some(components) = self.components() {
                    for c in components {
                        c.to_bits().hash(state);
                    }
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::IntArray(v) => write!(f, "{v:?}"),
            Value::Float(v) => write!(f, "{v}"),
            _ => {
                let components = self.components().unwrap_or_default();
                write!(f, "{}(", self.value_type())?;
                for (i, c) in components.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{c}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn value_types() {
        assert_eq!(Value::Float3([0.0; 3]).value_type(), ValueType::Float3);
        assert_eq!(Value::IntArray(vec![1]).value_type().signature(), "int[]");
        assert_eq!(ValueType::Float4x4.component_count(), Some(16));
        assert_eq!(ValueType::Bool.component_count(), None);
    }

    #[test]
    fn zero_and_one() {
        assert!(Value::Float(0.0).is_zero());
        assert!(Value::Float(-0.0).is_zero());
        assert!(Value::Int(0).is_zero());
        assert!(Value::Float3([0.0, 0.0, 0.0]).is_zero());
        assert!(!Value::Float3([0.0, 1.0, 0.0]).is_zero());
        assert!(Value::Float2([1.0, 1.0]).is_one());
        assert!(!Value::Float2([1.0, -1.0]).is_one());
        assert!(!Value::Bool(false).is_zero());
        assert!(!Value::String("0".into()).is_zero());
    }

    #[test]
    fn unit_magnitude() {
        assert!(Value::Float3([1.0, -1.0, 1.0]).is_unit_magnitude());
        assert!(Value::Int(-1).is_unit_magnitude());
        assert!(!Value::Float3([1.0, -2.0, 1.0]).is_unit_magnitude());
        assert!(!Value::Int(i32::MIN).is_unit_magnitude());
        assert!(!Value::Int(i32::MAX).is_unit_magnitude());
    }

    #[test]
    fn equality_is_bitwise() {
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::Float(f32::NAN), Value::Float(f32::NAN));
        assert_eq!(Value::Float2([1.0, 2.0]), Value::Float2([1.0, 2.0]));
        assert_ne!(Value::Float(1.0), Value::Int(1));
        assert_ne!(Value::Float4([0.0; 4]), Value::Float2([0.0; 2]));
    }

    #[test]
    fn hash_agrees_with_eq() {
        let mut set = HashSet::new();
        set.insert(Value::Float3([1.0, 2.0, 3.0]));
        set.insert(Value::Float3([1.0, 2.0, 3.0]));
        set.insert(Value::Float(0.0));
        set.insert(Value::Float(-0.0));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn serde_tagged_form() {
        let json = serde_json::to_string(&Value::Float2([1.0, 2.0])).unwrap();
        assert_eq!(json, r#"{"type":"float2","value":[1.0,2.0]}"#);
        let back: Value = serde_json::from_str(r#"{"type":"intArray","value":[3,4]}"#).unwrap();
        assert_eq!(back, Value::IntArray(vec![3, 4]));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Value::Float3([1.0, 2.0, 3.0])), "float3(1, 2, 3)");
        assert_eq!(format!("{}", Value::String("/nodes/0".into())), "\"/nodes/0\"");
    }
}
