//! Forward conversion: primitive Value → CSV column text.

use schema_core::{PrimitiveKind, Value};

/// Wrapper for CSV column text.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvValue(pub String);

impl CsvValue {
    /// Get the inner CSV string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Get a reference to the inner CSV string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Format a primitive value, or `None` when the value is not of `kind`.
///
/// Floating point values use the shortest text that parses back to the
/// same value and always keep a fractional part or exponent.
pub fn format_primitive(kind: PrimitiveKind, value: &Value) -> Option<CsvValue> {
    let text = match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => b.to_string(),
        (PrimitiveKind::Byte, Value::Byte(i)) => i.to_string(),
        (PrimitiveKind::Short, Value::Short(i)) => i.to_string(),
        (PrimitiveKind::Int, Value::Int(i)) => i.to_string(),
        (PrimitiveKind::Long, Value::Long(i)) => i.to_string(),
        (PrimitiveKind::Float, Value::Float(f)) => format!("{f:?}"),
        (PrimitiveKind::Double, Value::Double(f)) => format!("{f:?}"),
        (PrimitiveKind::Char, Value::Char(c)) => c.to_string(),
        (PrimitiveKind::String, Value::String(s)) => s.clone(),
        _ => return None,
    };
    Some(CsvValue(text))
}
