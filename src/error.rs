//! Error types for resolution and JSON loading.
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaErrorKind {
    UnresolvedReference,
    NamingCollision,
    IncompatibleUnion,
    CyclicReference,
    InvalidName,
}

/// Resolution failure. Resolution is all-or-nothing: no partial map is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unresolved reference `{name}` in {context}")]
    UnresolvedReference { name: String, context: String },

    #[error("naming collision on `{name}`: {detail}")]
    NamingCollision { name: String, detail: String },

    #[error("incompatible union in {context}: {detail}")]
    IncompatibleUnion { context: String, detail: String },

    #[error("cyclic reference: {}", path.join(" -> "))]
    CyclicReference { path: Vec<String> },

    #[error("invalid identifier `{name}`")]
    InvalidName { name: String },
}

impl SchemaError {
    pub fn kind(&self) -> SchemaErrorKind {
        match self {
            SchemaError::UnresolvedReference { .. } => SchemaErrorKind::UnresolvedReference,
            SchemaError::NamingCollision { .. } => SchemaErrorKind::NamingCollision,
            SchemaError::IncompatibleUnion { .. } => SchemaErrorKind::IncompatibleUnion,
            SchemaError::CyclicReference { .. } => SchemaErrorKind::CyclicReference,
            SchemaError::InvalidName { .. } => SchemaErrorKind::InvalidName,
        }
    }

    pub(crate) fn collision(name: impl Into<String>, detail: impl Into<String>) -> Self {
        SchemaError::NamingCollision { name: name.into(), detail: detail.into() }
    }
}

/// Failure to load a schema or config document from JSON.
#[derive(Debug, Error)]
#[error("at JSON path {path} → {source}")]
pub struct LoadError {
    pub path: String,
    #[source]
    pub source: serde_json::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_message_joins_path() {
        let e = SchemaError::CyclicReference { path: vec!["A".into(), "B".into(), "A".into()] };
        assert_eq!(e.to_string(), "cyclic reference: A -> B -> A");
        assert_eq!(e.kind(), SchemaErrorKind::CyclicReference);
    }
}
