//! Input model: the abstract schema graph handed to the mapper.
//!
//! The source format that produces it (IDL, TypeScript declarations, ...) lives
//! elsewhere. Schemas are built in memory with the `SchemaNode` helpers or
//! loaded from their serde representation via [`Schema::from_json_str`].
pub mod scalar;

use serde::{Deserialize, Serialize};

pub use scalar::{LiteralValue, ScalarFamily, ScalarKind};

// ------------------------------ Nodes ------------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaNode {
    Scalar { scalar: ScalarKind },
    Literal { value: LiteralValue },
    Array { element: Box<SchemaNode> },
    Union { members: Vec<SchemaNode> },
    Reference { name: String },
    /// Named alias declared in place; behaves as a reference wherever it appears.
    Alias { name: String, target: Box<SchemaNode> },
    Null,
    Dynamic,
}

impl SchemaNode {
    pub fn scalar(kind: ScalarKind) -> Self { SchemaNode::Scalar { scalar: kind } }
    pub fn literal(value: impl Into<LiteralValue>) -> Self { SchemaNode::Literal { value: value.into() } }
    pub fn array(element: SchemaNode) -> Self { SchemaNode::Array { element: Box::new(element) } }
    pub fn reference(name: impl Into<String>) -> Self { SchemaNode::Reference { name: name.into() } }
    pub fn union<I: IntoIterator<Item = SchemaNode>>(members: I) -> Self {
        SchemaNode::Union { members: members.into_iter().collect() }
    }
    pub fn alias(name: impl Into<String>, target: SchemaNode) -> Self {
        SchemaNode::Alias { name: name.into(), target: Box::new(target) }
    }

    pub fn boolean() -> Self { Self::scalar(ScalarKind::Boolean) }
    pub fn number() -> Self { Self::scalar(ScalarKind::Number) }
    pub fn string() -> Self { Self::scalar(ScalarKind::String) }

    /// Visit this node and every node below it, parents first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SchemaNode)) {
        visit(self);
        match self {
            SchemaNode::Array { element } => element.walk(visit),
            SchemaNode::Union { members } => {
                for m in members { m.walk(visit); }
            }
            SchemaNode::Alias { target, .. } => target.walk(visit),
            _ => {}
        }
    }
}

// --------------------------- Declarations --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SchemaNode,
    #[serde(default)]
    pub optional: bool,
    /// Serialized-name override; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, ty: SchemaNode) -> Self {
        Self { name: name.into(), ty, optional: false, rename: None }
    }
    pub fn optional(mut self) -> Self { self.optional = true; self }
    pub fn rename(mut self, serialized: impl Into<String>) -> Self {
        self.rename = Some(serialized.into());
        self
    }
    pub fn serialized_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl ObjectSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: Vec::new() }
    }
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclarationSchema {
    Object(ObjectSchema),
    Alias { name: String, target: SchemaNode },
}

impl DeclarationSchema {
    pub fn name(&self) -> &str {
        match self {
            DeclarationSchema::Object(o) => &o.name,
            DeclarationSchema::Alias { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub declarations: Vec<DeclarationSchema>,
}

impl Schema {
    pub fn new() -> Self { Self::default() }

    pub fn object(mut self, object: ObjectSchema) -> Self {
        self.declarations.push(DeclarationSchema::Object(object));
        self
    }

    pub fn alias(mut self, name: impl Into<String>, target: SchemaNode) -> Self {
        self.declarations.push(DeclarationSchema::Alias { name: name.into(), target });
        self
    }

    /// Every node reachable from the declarations, in declaration order.
    pub fn nodes(&self) -> Vec<&SchemaNode> {
        let mut out = Vec::new();
        for decl in &self.declarations {
            match decl {
                DeclarationSchema::Object(o) => {
                    for f in &o.fields { f.ty.walk(&mut |n| out.push(n)); }
                }
                DeclarationSchema::Alias { target, .. } => target.walk(&mut |n| out.push(n)),
            }
        }
        out
    }
}
