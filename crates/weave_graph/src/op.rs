//! Operation kinds and their glTF op strings.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_ops {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)*) => {
        /// The operation a node performs.
        ///
        /// Kinds the optimizer reasons about are enum variants; every other
        /// op string is carried through unchanged as [`Op::Other`].
        #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum Op {
            $($(#[$meta])* $variant,)*
            /// An op the optimizer does not model.
            Other(String),
        }

        impl Op {
            /// Every modelled op, in declaration order.
            pub const KNOWN: &'static [Op] = &[$(Op::$variant,)*];

            /// Returns the glTF op string, e.g. `"math/add"`.
            pub fn as_str(&self) -> &str {
                match self {
                    $(Op::$variant => $name,)*
                    Op::Other(name) => name,
                }
            }

            /// Parses a glTF op string, falling back to [`Op::Other`].
            pub fn parse(name: &str) -> Self {
                match name {
                    $($name => Op::$variant,)*
                    other => Op::Other(other.to_string()),
                }
            }
        }
    };
}

define_ops! {
    Add => "math/add",
    Sub => "math/sub",
    Mul => "math/mul",
    Div => "math/div",
    Rem => "math/rem",
    Neg => "math/neg",
    Abs => "math/abs",
    Min => "math/min",
    Max => "math/max",
    Dot => "math/dot",
    Length => "math/length",
    Saturate => "math/saturate",
    Deg => "math/deg",
    Rad => "math/rad",
    Exp => "math/exp",
    Log => "math/log",
    Pow => "math/pow",
    Sqrt => "math/sqrt",
    Sin => "math/sin",
    Cos => "math/cos",
    Tan => "math/tan",
    Asin => "math/asin",
    Acos => "math/acos",
    Atan => "math/atan",
    Atan2 => "math/atan2",
    Combine2 => "math/combine2",
    Combine3 => "math/combine3",
    Combine4 => "math/combine4",
    MatDecompose => "math/matDecompose",
    Random => "math/random",
    PointerGet => "pointer/get",
    PointerSet => "pointer/set",
    VariableGet => "variable/get",
    VariableSet => "variable/set",
    VariableSetMultiple => "variable/setMultiple",
    VariableInterpolate => "variable/interpolate",
    Sequence => "flow/sequence",
    WaitAll => "flow/waitAll",
    Branch => "flow/branch",
    OnStart => "event/onStart",
    OnTick => "event/onTick",
    OnSelect => "event/onSelect",
    OnHoverIn => "event/onHoverIn",
    OnHoverOut => "event/onHoverOut",
    BoolToFloat => "type/boolToFloat",
    FloatToBool => "type/floatToBool",
    BoolToInt => "type/boolToInt",
    IntToBool => "type/intToBool",
    FloatToInt => "type/floatToInt",
    IntToFloat => "type/intToFloat",
}

impl Op {
    /// Input flow sockets a freshly created node of this kind declares.
    pub fn default_input_flows(&self) -> &'static [&'static str] {
        match self {
            Op::PointerSet
            | Op::VariableSet
            | Op::VariableSetMultiple
            | Op::VariableInterpolate
            | Op::Sequence
            | Op::Branch => &["in"],
            _ => &[],
        }
    }

    /// Returns `true` for event entry points, which have no input flows.
    pub fn is_event(&self) -> bool {
        matches!(
            self,
            Op::OnStart | Op::OnTick | Op::OnSelect | Op::OnHoverIn | Op::OnHoverOut
        )
    }

    /// Returns `true` for pointer interaction events merged by fan-in reduction.
    pub fn is_pointer_event(&self) -> bool {
        matches!(self, Op::OnSelect | Op::OnHoverIn | Op::OnHoverOut)
    }

    /// Returns `true` for ops whose configuration names variables they write.
    pub fn writes_variables(&self) -> bool {
        matches!(
            self,
            Op::VariableSet | Op::VariableSetMultiple | Op::VariableInterpolate
        )
    }

    /// Returns `true` for ops that carry a variable index in their configuration.
    pub fn references_variables(&self) -> bool {
        *self == Op::VariableGet || self.writes_variables()
    }

    /// Returns `true` for the scalar type-conversion ops.
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            Op::BoolToFloat
                | Op::FloatToBool
                | Op::BoolToInt
                | Op::IntToBool
                | Op::FloatToInt
                | Op::IntToFloat
        )
    }
}

impl From<String> for Op {
    fn from(name: String) -> Self {
        Op::parse(&name)
    }
}

impl From<Op> for String {
    fn from(op: Op) -> Self {
        match op {
            Op::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
