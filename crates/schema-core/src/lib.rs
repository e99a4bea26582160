//! Core types for the schema-csv codec.
//!
//! This crate provides the foundational types shared by the codec crates:
//!
//! - [`Schema`] - Structural description of a value (records, lists, maps,
//!   enums, unions, singletons and primitives)
//! - [`Value`] - Dynamic value tree decoded from or encoded to a format
//! - [`SchemaDocument`] - Schema definitions loaded from YAML
//!
//! # Architecture
//!
//! ```text
//! schema-core (this crate)
//!    │
//!    ├─── json-types   (Value <-> serde_json::Value, guided by Schema)
//!    └─── csv-codec    (Value <-> CSV text, guided by Schema and Dialect)
//! ```
//!
//! # Example
//!
//! ```rust
//! use schema_core::{Field, Schema, Value};
//!
//! let schema = Schema::record(
//!     "Point",
//!     vec![Field::new("x", Schema::int()), Field::new("y", Schema::int())],
//! );
//! let value = Value::record(vec![Value::Int(1), Value::Int(2)]);
//! assert!(schema.as_record().is_some());
//! assert_eq!(value.as_record().map(|f| f.len()), Some(2));
//! ```

pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use schema::{SchemaDocument, SchemaError};
pub use types::{
    EnumSchema, Field, PrimitiveKind, RecordSchema, Schema, SchemaKind, UnionSchema, Variant,
};
pub use values::Value;
