//! JSON type conversions for schema-core values.
//!
//! This crate provides bidirectional conversions between schema-core's
//! [`Value`](schema_core::Value) and JSON, guided by a
//! [`Schema`](schema_core::Schema).
//!
//! # Modules
//!
//! - [`forward`] - Value → JSON value conversion
//! - [`reverse`] - JSON value → Value conversion
//!
//! # Example
//!
//! ```rust
//! use json_types::{value_to_json, JsonValueWithSchema};
//! use schema_core::{Schema, Value};
//!
//! // Forward: Value → JSON value
//! let json = value_to_json(&Schema::list(Schema::int()), &Value::from(vec![1, 2])).unwrap();
//! assert_eq!(json, serde_json::json!([1, 2]));
//!
//! // Reverse: JSON value → Value
//! let schema = Schema::int();
//! let value = JsonValueWithSchema::new(serde_json::json!(42), &schema).to_value().unwrap();
//! assert_eq!(value, Value::Int(42));
//! ```

pub mod error;
pub mod forward;
pub mod reverse;

pub use error::JsonConversionError;
pub use forward::{value_to_json, value_to_json_string, JsonValue};
pub use reverse::{json_str_to_value, json_to_value, JsonValueWithSchema};

/// Member holding the variant tag of a union value.
pub const TYPE_DISCRIMINATOR: &str = "type";

/// Member holding the payload of a union variant that is not a record.
pub const VALUE_MEMBER: &str = "value";
