//! Forward conversion: Value → JSON value.
//!
//! Records become objects keyed by field name, union variants become objects
//! carrying a `"type"` member, and maps with scalar keys become objects.

use crate::error::JsonConversionError;
use crate::{TYPE_DISCRIMINATOR, VALUE_MEMBER};
use schema_core::{PrimitiveKind, Schema, SchemaKind, UnionSchema, Value};
use serde_json::{json, Map, Number};

/// Wrapper for JSON values.
#[derive(Debug, Clone)]
pub struct JsonValue(pub serde_json::Value);

impl JsonValue {
    /// Get the inner JSON value.
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Get a reference to the inner JSON value.
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }
}

/// Convert a value to JSON following its schema.
pub fn value_to_json(schema: &Schema, value: &Value) -> Result<serde_json::Value, JsonConversionError> {
    convert(schema, value, "$")
}

/// Convert a value to compact JSON text.
pub fn value_to_json_string(schema: &Schema, value: &Value) -> Result<String, JsonConversionError> {
    let json = value_to_json(schema, value)?;
    Ok(serde_json::to_string(&json)?)
}

/// Whether map keys of this schema can be written as object member names.
pub(crate) fn is_object_key(schema: &Schema) -> bool {
    !schema.nullable && matches!(schema.kind, SchemaKind::Primitive(_) | SchemaKind::Enum(_))
}

fn convert(schema: &Schema, value: &Value, path: &str) -> Result<serde_json::Value, JsonConversionError> {
    if value.is_null() {
        return if schema.nullable {
            Ok(serde_json::Value::Null)
        } else {
            Err(JsonConversionError::mismatch(path, schema.describe(), "null"))
        };
    }

    match (&schema.kind, value) {
        (SchemaKind::Primitive(kind), _) => primitive(*kind, value, path),

        (SchemaKind::Enum(e), Value::Enum(name)) => {
            if e.contains(name) {
                Ok(json!(name))
            } else {
                Err(JsonConversionError::UnknownVariant {
                    path: path.to_string(),
                    tag: name.clone(),
                })
            }
        }

        (SchemaKind::List(element), Value::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| convert(element, item, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array),

        (SchemaKind::Map { key, value: value_schema }, Value::Map(entries)) => {
            if is_object_key(key) {
                let mut object = Map::new();
                for (k, v) in entries {
                    let name = key_to_string(key, k, path)?;
                    let member = convert(value_schema, v, &format!("{path}.{name}"))?;
                    object.insert(name, member);
                }
                Ok(serde_json::Value::Object(object))
            } else {
                entries
                    .iter()
                    .enumerate()
                    .map(|(i, (k, v))| {
                        let entry_path = format!("{path}[{i}]");
                        Ok(json!([convert(key, k, &entry_path)?, convert(value_schema, v, &entry_path)?]))
                    })
                    .collect::<Result<Vec<_>, JsonConversionError>>()
                    .map(serde_json::Value::Array)
            }
        }

        (SchemaKind::Record(record), Value::Record(fields)) => {
            if fields.len() != record.fields.len() {
                return Err(JsonConversionError::mismatch(
                    path,
                    format!("{} fields", record.fields.len()),
                    format!("{} fields", fields.len()),
                ));
            }
            let mut object = Map::new();
            for (field, v) in record.fields.iter().zip(fields) {
                let member = convert(&field.schema, v, &format!("{path}.{}", field.name))?;
                object.insert(field.name.clone(), member);
            }
            Ok(serde_json::Value::Object(object))
        }

        (SchemaKind::Sealed(union) | SchemaKind::Open(union), Value::Variant { tag, value }) => {
            variant(union, tag, value, path)
        }

        (SchemaKind::Singleton(_), Value::Singleton) => Ok(json!({})),

        _ => Err(JsonConversionError::mismatch(path, schema.describe(), value.kind_name())),
    }
}

fn primitive(kind: PrimitiveKind, value: &Value, path: &str) -> Result<serde_json::Value, JsonConversionError> {
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => Ok(json!(*b)),
        (PrimitiveKind::Byte, Value::Byte(i)) => Ok(json!(*i)),
        (PrimitiveKind::Short, Value::Short(i)) => Ok(json!(*i)),
        (PrimitiveKind::Int, Value::Int(i)) => Ok(json!(*i)),
        (PrimitiveKind::Long, Value::Long(i)) => Ok(json!(*i)),
        (PrimitiveKind::Float, Value::Float(f)) => float(f64::from(*f), path),
        (PrimitiveKind::Double, Value::Double(f)) => float(*f, path),
        (PrimitiveKind::Char, Value::Char(c)) => Ok(json!(c.to_string())),
        (PrimitiveKind::String, Value::String(s)) => Ok(json!(s)),
        _ => Err(JsonConversionError::mismatch(path, kind.name(), value.kind_name())),
    }
}

fn float(f: f64, path: &str) -> Result<serde_json::Value, JsonConversionError> {
    Number::from_f64(f)
        .map(serde_json::Value::Number)
        .ok_or_else(|| JsonConversionError::NonFinite {
            path: path.to_string(),
            value: f,
        })
}

fn variant(
    union: &UnionSchema,
    tag: &str,
    value: &Value,
    path: &str,
) -> Result<serde_json::Value, JsonConversionError> {
    let index = union
        .variant_index(tag)
        .ok_or_else(|| JsonConversionError::UnknownVariant {
            path: path.to_string(),
            tag: tag.to_string(),
        })?;
    let variant_schema = &union.variants[index].schema;

    let mut object = Map::new();
    object.insert(TYPE_DISCRIMINATOR.to_string(), json!(tag));
    match convert(variant_schema, value, &format!("{path}<{tag}>"))? {
        serde_json::Value::Object(members)
            if variant_schema.is_record()
                || matches!(variant_schema.kind, SchemaKind::Singleton(_)) =>
        {
            object.extend(members);
        }
        other => {
            object.insert(VALUE_MEMBER.to_string(), other);
        }
    }
    Ok(serde_json::Value::Object(object))
}

fn key_to_string(schema: &Schema, key: &Value, path: &str) -> Result<String, JsonConversionError> {
    match convert(schema, key, path)? {
        serde_json::Value::String(s) => Ok(s),
        other => Ok(other.to_string()),
    }
}
