//! Reverse conversion: CSV column text → primitive Value.

use schema_core::{PrimitiveKind, Value};
use std::str::FromStr;

/// Error type for CSV parsing failures.
#[derive(Debug, Clone)]
pub struct CsvParseError {
    pub message: String,
    pub value: String,
    pub expected_type: String,
}

impl std::fmt::Display for CsvParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to parse '{}' as {}: {}",
            self.value, self.expected_type, self.message
        )
    }
}

impl std::error::Error for CsvParseError {}

impl CsvParseError {
    fn new(value: &str, kind: PrimitiveKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: value.to_string(),
            expected_type: kind.name().to_string(),
        }
    }
}

/// Parse column text as a primitive of `kind`.
///
/// This is the reverse of [`format_primitive`](crate::forward::format_primitive).
pub fn parse_primitive(text: &str, kind: PrimitiveKind) -> Result<Value, CsvParseError> {
    match kind {
        // Boolean - case-insensitive true/false only
        PrimitiveKind::Bool => {
            if text.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(CsvParseError::new(text, kind, "expected 'true' or 'false'"))
            }
        }
        PrimitiveKind::Byte => parse_number(text, kind).map(Value::Byte),
        PrimitiveKind::Short => parse_number(text, kind).map(Value::Short),
        PrimitiveKind::Int => parse_number(text, kind).map(Value::Int),
        PrimitiveKind::Long => parse_number(text, kind).map(Value::Long),
        PrimitiveKind::Float => parse_number(text, kind).map(Value::Float),
        PrimitiveKind::Double => parse_number(text, kind).map(Value::Double),
        PrimitiveKind::Char => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(CsvParseError::new(text, kind, "expected exactly one character")),
            }
        }
        PrimitiveKind::String => Ok(Value::String(text.to_string())),
    }
}

fn parse_number<T>(text: &str, kind: PrimitiveKind) -> Result<T, CsvParseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>()
        .map_err(|e| CsvParseError::new(text, kind, e.to_string()))
}
