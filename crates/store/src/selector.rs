//! Record selectors for untyped (`serde_json::Value`) collections.
//!
//! Used where predicates come from text, e.g. command-line flags.

use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// Matches the record at this zero-based position.
    Index(usize),
    /// Matches object records whose `field` equals `value`.
    FieldEq { field: String, value: Value },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("expected FIELD=VALUE, got `{0}`")]
    MissingEquals(String),
    #[error("field name is empty in `{0}`")]
    EmptyField(String),
}

impl Selector {
    pub fn matches(&self, record: &Value, index: usize) -> bool {
        match self {
            Self::Index(i) => *i == index,
            Self::FieldEq { field, value } => record.get(field.as_str()) == Some(value),
        }
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    /// Parse `FIELD=VALUE`. VALUE is read as JSON and falls back to a plain
    /// string, so `id=2` matches a number and `name=bob` a string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, raw) = s
            .split_once('=')
            .ok_or_else(|| SelectorError::MissingEquals(s.to_string()))?;
        let field = field.trim();
        if field.is_empty() {
            return Err(SelectorError::EmptyField(s.to_string()));
        }
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(Self::FieldEq { field: field.to_string(), value })
    }
}
