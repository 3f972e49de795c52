//! Untyped caller input.
//!
//! Callers of the conversion entry points may send anything in the amount and
//! currency slots. `RawInput` captures that shape exactly so validation can
//! narrow it into typed values before any business logic runs.

use serde_json::Value;

/// A value as received from an untyped caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    /// The field was not supplied at all.
    Undefined,
    /// The field was explicitly null.
    Null,
    /// Any numeric value, including NaN and infinities.
    Number(f64),
    /// A string value.
    Text(String),
    /// A boolean value.
    Bool(bool),
    /// An array of values.
    Array(Vec<RawInput>),
    /// An object (contents are never inspected).
    Object,
}

impl RawInput {
    /// Short type name used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Array(_) => "array",
            Self::Object => "object",
        }
    }

    /// Converts an optional JSON field; a missing field becomes `Undefined`.
    #[must_use]
    pub fn from_field(value: Option<Value>) -> Self {
        value.map_or(Self::Undefined, Self::from)
    }
}

impl From<Value> for RawInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            // Numbers too large for f64 surface as infinity.
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::INFINITY)),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Object(_) => Self::Object,
        }
    }
}

impl From<f64> for RawInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for RawInput {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<RawInput>> From<Option<T>> for RawInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
