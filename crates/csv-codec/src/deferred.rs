//! Deferred sub-codec for variable-width subtrees.
//!
//! Lists, maps and open unions occupy a data-dependent number of columns
//! when laid out inline, which rules out header rows. A dialect carrying a
//! [`SubCodec`] writes each such subtree as one opaque column instead.

use crate::dialect::Dialect;
use schema_core::{Schema, Value};

/// Error returned by a sub-codec.
pub type SubCodecError = Box<dyn std::error::Error + Send + Sync>;

/// External format used for single-column subtrees.
pub trait SubCodec: Send + Sync {
    fn encode_to_string(&self, schema: &Schema, value: &Value) -> Result<String, SubCodecError>;

    fn decode_from_string(&self, schema: &Schema, text: &str) -> Result<Value, SubCodecError>;
}

/// Embeds subtrees as compact JSON text.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSubCodec;

impl SubCodec for JsonSubCodec {
    fn encode_to_string(&self, schema: &Schema, value: &Value) -> Result<String, SubCodecError> {
        Ok(json_types::value_to_json_string(schema, value)?)
    }

    fn decode_from_string(&self, schema: &Schema, text: &str) -> Result<Value, SubCodecError> {
        Ok(json_types::json_str_to_value(schema, text)?)
    }
}

/// The sub-codec responsible for `schema`, if the dialect defers it.
pub(crate) fn deferred_codec<'d>(dialect: &'d Dialect, schema: &Schema) -> Option<&'d dyn SubCodec> {
    if schema.is_variable_width() {
        dialect.deferred.as_deref()
    } else {
        None
    }
}
