//! Conversion errors.

/// Error type for JSON conversion failures.
#[derive(Debug, thiserror::Error)]
pub enum JsonConversionError {
    #[error("Expected {expected} at '{path}' but found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Unknown variant '{tag}' at '{path}'")]
    UnknownVariant { path: String, tag: String },

    #[error("Missing field '{field}' at '{path}'")]
    MissingField { path: String, field: String },

    #[error("Number {value} at '{path}' is out of range for {expected}")]
    OutOfRange {
        path: String,
        value: String,
        expected: String,
    },

    #[error("Non-finite float {value} at '{path}' has no JSON representation")]
    NonFinite { path: String, value: f64 },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl JsonConversionError {
    pub(crate) fn mismatch(path: &str, expected: impl Into<String>, found: impl Into<String>) -> Self {
        JsonConversionError::TypeMismatch {
            path: path.to_string(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Short name of a JSON value's type.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
