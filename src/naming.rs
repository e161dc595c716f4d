//! Identifier rules for declarations and generated field names.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SchemaError;

static IDENT_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid")
});

pub fn is_valid_ident(s: &str) -> bool {
    IDENT_RX.is_match(s)
}

pub fn check_ident(name: &str) -> Result<(), SchemaError> {
    if is_valid_ident(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName { name: name.to_string() })
    }
}

/// `my_bool` → `MyBool`, `otherDude` → `OtherDude`, `url-2` → `Url2`.
///
/// Words split on any non-ASCII-alphanumeric character and on lower→upper
/// boundaries. Each word keeps its tail as written, so `HTTPCode` stays
/// `HTTPCode`.
pub fn pascal_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;
    let mut prev_lower = false;
    for c in raw.chars() {
        if !c.is_ascii_alphanumeric() {
            at_word_start = true;
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            at_word_start = true;
        }
        if at_word_start {
            out.push(c.to_ascii_uppercase());
            at_word_start = false;
        } else {
            out.push(c);
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
    }
    if out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}
