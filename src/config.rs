//! Mapper policy knobs.
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// What to do with a union whose members cannot be collapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionPolicy {
    /// Map to `Ty::Dynamic`.
    #[default]
    Open,
    /// Fail with `IncompatibleUnion`.
    Strict,
}

/// How a field-level union of objects is represented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineUnionPolicy {
    /// Emit a merged object named `<Parent><FieldIdent>`.
    #[default]
    Synthesize,
    /// Leave the field dynamic.
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    pub union_policy: UnionPolicy,
    pub inline_object_unions: InlineUnionPolicy,
    /// Optional fields get `omit_empty` in their serialization tag.
    pub omit_empty_optional: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            union_policy: UnionPolicy::Open,
            inline_object_unions: InlineUnionPolicy::Synthesize,
            omit_empty_optional: true,
        }
    }
}

impl MapperConfig {
    pub fn strict() -> Self {
        Self { union_policy: UnionPolicy::Strict, ..Self::default() }
    }

    pub fn from_json_str(src: &str) -> Result<Self, LoadError> {
        crate::path_de::from_str_with_path(src)
    }
}
