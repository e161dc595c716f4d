//! Schema-driven type mapper.
//!
//! Resolve an abstract [`Schema`] (scalars, literals, arrays, unions, aliases,
//! object references) into an ordered [`TypeMap`] of object and alias
//! declarations whose fields carry stable identifiers and serialization tags.
//! Rendering the declarations as source text is left to a downstream emitter.
//!
//! ```
//! use schema_typemap::{resolve, FieldSchema, ObjectSchema, Schema, SchemaNode, Ty, ScalarKind};
//!
//! let schema = Schema::new().object(
//!     ObjectSchema::new("Thumbnail")
//!         .field(FieldSchema::new("w", SchemaNode::scalar(ScalarKind::Int)))
//!         .field(FieldSchema::new("url", SchemaNode::string()).optional()),
//! );
//! let map = resolve(&schema).unwrap();
//! let thumb = map.object("Thumbnail").unwrap();
//! assert_eq!(thumb.fields[0].ident, "W");
//! assert_eq!(thumb.fields[0].ty, Ty::Scalar(ScalarKind::Int));
//! assert!(thumb.fields[1].tag().omit_empty);
//! ```
pub mod config;
pub mod error;
pub mod ir;
pub mod json_schema;
pub mod naming;
pub mod path_de;
pub mod resolve;
pub mod schema;

pub use config::{InlineUnionPolicy, MapperConfig, UnionPolicy};
pub use error::{LoadError, SchemaError, SchemaErrorKind};
pub use ir::{AliasDescriptor, Declaration, FieldDescriptor, ObjectDescriptor, SerializationTag, Ty, TypeMap};
pub use resolve::{resolve, TypeMapper};
pub use schema::{
    DeclarationSchema, FieldSchema, LiteralValue, ObjectSchema, ScalarFamily, ScalarKind, Schema, SchemaNode,
};
