//! JSON loading with the failing path in the error.
use serde::de::DeserializeOwned;

use crate::error::LoadError;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_load_error)
}

pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_load_error)
}

fn into_load_error(err: serde_path_to_error::Error<serde_json::Error>) -> LoadError {
    let path = err.path().to_string();
    LoadError { path, source: err.into_inner() }
}

impl crate::schema::Schema {
    pub fn from_json_str(src: &str) -> Result<Self, LoadError> {
        from_str_with_path(src)
    }
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        from_slice_with_path(bytes)
    }
}
