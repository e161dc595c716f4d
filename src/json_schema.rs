//! Debug view of a resolved map as a JSON Schema document (`$defs` + `$ref`).

use serde_json::{json, Map, Value};

use crate::ir::{Declaration, ObjectDescriptor, Ty, TypeMap};
use crate::schema::ScalarKind;

// ————————————————————————————————————————————————————————————————————————————
// JSON SCHEMA CG
// ————————————————————————————————————————————————————————————————————————————

fn scalar_schema(kind: ScalarKind) -> Value {
    match kind {
        ScalarKind::Boolean => json!({ "type": "boolean" }),
        ScalarKind::String => json!({ "type": "string" }),
        k if k.is_integer() => json!({ "type": "integer", "format": k.as_str() }),
        ScalarKind::Number => json!({ "type": "number" }),
        k => json!({ "type": "number", "format": k.as_str() }),
    }
}

pub fn schema_from_ty(ty: &Ty) -> Value {
    match ty {
        Ty::Scalar(kind) => scalar_schema(*kind),
        Ty::Array(item) => json!({ "type": "array", "items": schema_from_ty(item) }),
        Ty::Named(name) => json!({ "$ref": format!("#/$defs/{name}") }),
        Ty::Nullable(inner) => json!({ "oneOf": [schema_from_ty(inner), { "type": "null" }] }),
        Ty::Dynamic => json!({}),
    }
}

fn object_schema(obj: &ObjectDescriptor) -> Value {
    let mut props = Map::new();
    for f in &obj.fields {
        props.insert(f.serialized_name.clone(), schema_from_ty(&f.ty));
    }
    let required: Vec<Value> = obj.fields.iter()
        .filter(|f| !f.optional)
        .map(|f| Value::from(f.serialized_name.clone()))
        .collect();

    let mut o = json!({ "type": "object", "properties": props });
    if !required.is_empty() {
        o["required"] = Value::Array(required);
    }
    o
}

pub fn schema_from_declaration(decl: &Declaration) -> Value {
    match decl {
        Declaration::Object(o) => object_schema(o),
        Declaration::Alias(a) => schema_from_ty(&a.target),
    }
}

impl TypeMap {
    pub fn to_json_schema(&self) -> Value {
        let defs: Map<String, Value> = self.declarations()
            .map(|d| (d.name().to_string(), schema_from_declaration(d)))
            .collect();
        json!({ "$defs": defs })
    }
}
