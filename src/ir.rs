//! Resolved, strongly-typed output of the mapper. No schema nodes in here.

use indexmap::IndexMap;
use serde::Serialize;

use crate::schema::ScalarKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Ty {
    Scalar(ScalarKind),
    Array(Box<Ty>),
    Named(String),           // object or alias declared in the same map
    Nullable(Box<Ty>),       // X ∪ null
    Dynamic,                 // open representation (`interface{}`)
}

impl Ty {
    pub fn array(element: Ty) -> Self { Ty::Array(Box::new(element)) }
    pub fn nullable(inner: Ty) -> Self {
        match inner {
            // dynamic already admits null; never double-wrap
            Ty::Dynamic | Ty::Nullable(_) => inner,
            other => Ty::Nullable(Box::new(other)),
        }
    }
    pub fn named(name: impl Into<String>) -> Self { Ty::Named(name.into()) }

    pub fn is_dynamic(&self) -> bool { matches!(self, Ty::Dynamic) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SerializationTag<'a> {
    pub key: &'a str,
    pub omit_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub ident: String,           // target-language identifier
    pub serialized_name: String, // wire key
    pub ty: Ty,
    pub optional: bool,
    #[serde(skip)]
    pub(crate) omit_empty: bool,
}

impl FieldDescriptor {
    pub fn tag(&self) -> SerializationTag<'_> {
        SerializationTag { key: &self.serialized_name, omit_empty: self.optional && self.omit_empty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDescriptor {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,    // declaration order
}

impl ObjectDescriptor {
    pub fn field(&self, serialized_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.serialized_name == serialized_name)
    }
    pub fn optional_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.optional)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasDescriptor {
    pub name: String,
    pub target: Ty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Declaration {
    Object(ObjectDescriptor),
    Alias(AliasDescriptor),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Object(o) => &o.name,
            Declaration::Alias(a) => &a.name,
        }
    }
    pub fn as_object(&self) -> Option<&ObjectDescriptor> {
        match self { Declaration::Object(o) => Some(o), _ => None }
    }
    pub fn as_alias(&self) -> Option<&AliasDescriptor> {
        match self { Declaration::Alias(a) => Some(a), _ => None }
    }
}

/// Ordered name → declaration map produced by a successful resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TypeMap {
    pub(crate) decls: IndexMap<String, Declaration>,
}

impl TypeMap {
    pub fn len(&self) -> usize { self.decls.len() }
    pub fn is_empty(&self) -> bool { self.decls.is_empty() }
    pub fn get(&self, name: &str) -> Option<&Declaration> { self.decls.get(name) }
    pub fn object(&self, name: &str) -> Option<&ObjectDescriptor> {
        self.get(name).and_then(Declaration::as_object)
    }
    pub fn alias(&self, name: &str) -> Option<&AliasDescriptor> {
        self.get(name).and_then(Declaration::as_alias)
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.decls.keys().map(String::as_str)
    }
    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.decls.values()
    }
    pub fn into_declarations(self) -> Vec<Declaration> {
        self.decls.into_values().collect()
    }
}
