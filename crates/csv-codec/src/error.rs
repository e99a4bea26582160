//! Error type for encode/decode failures.
//!
//! Every failure terminates the call; no partial value or text is returned.
//! Offsets count characters from the start of the input.

use std::error::Error as StdError;

/// Error type for CSV encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum CsvError {
    /// Column text does not parse as the target primitive
    #[error("Failed to parse '{value}' as {expected} at '{path}' (offset {offset})")]
    MalformedPrimitive {
        value: String,
        expected: String,
        path: String,
        offset: usize,
    },

    /// Header names a field the schema does not have
    #[error("Unknown column header '{name}' at offset {offset}")]
    UnknownHeaderColumn { name: String, offset: usize },

    /// Header binds a field a second time, e.g. a nested group split apart
    #[error("Column header '{name}' at offset {offset} repeats a field already bound")]
    DuplicateHeaderColumn { name: String, offset: usize },

    /// Schema kind cannot be laid out in the requested position
    #[error("Unsupported {kind} schema at '{path}': {reason}")]
    UnsupportedSchemaKind {
        kind: String,
        path: String,
        reason: String,
    },

    /// Structure expects more columns or records than the input holds
    #[error("Unexpected end of input at offset {offset}")]
    UnexpectedEndOfInput { offset: usize },

    /// A record ends before its element has read all of its columns
    #[error("Record {record} ended early at '{path}' (offset {offset})")]
    UnexpectedEndOfRecord {
        record: usize,
        path: String,
        offset: usize,
    },

    /// A column that must hold the null token holds something else
    #[error("Expected '{expected}' but was '{actual}' at '{path}' (offset {offset})")]
    NullMarkerMismatch {
        expected: String,
        actual: String,
        path: String,
        offset: usize,
    },

    /// Dialect characters collide so tokenization is not well-defined
    #[error("Ambiguous dialect: {0}")]
    AmbiguousDialect(String),

    /// Enum value or union tag not declared in the schema
    #[error("Unknown variant '{value}' for {schema} at '{path}' (offset {offset})")]
    UnknownVariant {
        value: String,
        schema: String,
        path: String,
        offset: usize,
    },

    /// Header-driven decode left a required field unbound
    #[error("Missing column for required field '{field}' of record {record}")]
    MissingField { record: String, field: String },

    /// A row holds more columns than its element consumed
    #[error("Unexpected extra columns in record {record} at offset {offset}")]
    TrailingColumns { record: usize, offset: usize },

    /// Value handed to the encoder does not fit its schema
    #[error("Value does not match schema at '{path}': expected {expected}, found {found}")]
    ValueMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// The deferred sub-codec failed
    #[error("Deferred codec failed at '{path}': {source}")]
    Deferred {
        path: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Error reading from the character source
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Error writing to the character sink
    #[error("Failed to write output")]
    Fmt(#[from] std::fmt::Error),
}

/// Result type for CSV operations.
pub type Result<T> = std::result::Result<T, CsvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_location() {
        let err = CsvError::MalformedPrimitive {
            value: "abc".to_string(),
            expected: "int".to_string(),
            path: "data.speed".to_string(),
            offset: 12,
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse 'abc' as int at 'data.speed' (offset 12)"
        );

        let err = CsvError::UnknownHeaderColumn {
            name: "bogus".to_string(),
            offset: 4,
        };
        assert_eq!(err.to_string(), "Unknown column header 'bogus' at offset 4");
    }

    #[test]
    fn test_deferred_keeps_source() {
        let inner: Box<dyn StdError + Send + Sync> = "bad json".into();
        let err = CsvError::Deferred {
            path: "list".to_string(),
            source: inner,
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("bad json"));
    }
}
