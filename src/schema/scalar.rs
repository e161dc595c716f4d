//! Scalar kinds, their families, and literal values.
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Primitive leaf kinds. Sized kinds follow Go's numeric vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    #[serde(alias = "bool")]
    Boolean,
    Number,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Byte,
    Rune,
}

/// Coarse class used by union collapse: kinds of one family are compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarFamily {
    Boolean,
    Number,
    String,
}

impl ScalarKind {
    pub const ALL: [ScalarKind; 17] = [
        ScalarKind::Boolean,
        ScalarKind::Number,
        ScalarKind::String,
        ScalarKind::Int,
        ScalarKind::Int8,
        ScalarKind::Int16,
        ScalarKind::Int32,
        ScalarKind::Int64,
        ScalarKind::Uint,
        ScalarKind::Uint8,
        ScalarKind::Uint16,
        ScalarKind::Uint32,
        ScalarKind::Uint64,
        ScalarKind::Float32,
        ScalarKind::Float64,
        ScalarKind::Byte,
        ScalarKind::Rune,
    ];

    pub fn family(self) -> ScalarFamily {
        match self {
            ScalarKind::Boolean => ScalarFamily::Boolean,
            ScalarKind::String => ScalarFamily::String,
            _ => ScalarFamily::Number,
        }
    }

    /// Integral kinds (byte and rune included).
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ScalarKind::Int
                | ScalarKind::Int8
                | ScalarKind::Int16
                | ScalarKind::Int32
                | ScalarKind::Int64
                | ScalarKind::Uint
                | ScalarKind::Uint8
                | ScalarKind::Uint16
                | ScalarKind::Uint32
                | ScalarKind::Uint64
                | ScalarKind::Byte
                | ScalarKind::Rune
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Number => "number",
            ScalarKind::String => "string",
            ScalarKind::Int => "int",
            ScalarKind::Int8 => "int8",
            ScalarKind::Int16 => "int16",
            ScalarKind::Int32 => "int32",
            ScalarKind::Int64 => "int64",
            ScalarKind::Uint => "uint",
            ScalarKind::Uint8 => "uint8",
            ScalarKind::Uint16 => "uint16",
            ScalarKind::Uint32 => "uint32",
            ScalarKind::Uint64 => "uint64",
            ScalarKind::Float32 => "float32",
            ScalarKind::Float64 => "float64",
            ScalarKind::Byte => "byte",
            ScalarKind::Rune => "rune",
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ScalarFamily {
    /// The kind a mixed-kind union of this family widens to.
    pub fn base_kind(self) -> ScalarKind {
        match self {
            ScalarFamily::Boolean => ScalarKind::Boolean,
            ScalarFamily::Number => ScalarKind::Number,
            ScalarFamily::String => ScalarKind::String,
        }
    }
}

/// Literal refinement of a scalar (`true`, `1000`, `"LITERAL"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Number(OrderedFloat<f64>),
    String(String),
}

impl LiteralValue {
    pub fn base_kind(&self) -> ScalarKind {
        match self {
            LiteralValue::Bool(_) => ScalarKind::Boolean,
            LiteralValue::Number(_) => ScalarKind::Number,
            LiteralValue::String(_) => ScalarKind::String,
        }
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self { LiteralValue::Bool(b) }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self { LiteralValue::Number(OrderedFloat(n)) }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self { LiteralValue::String(s.to_string()) }
}
