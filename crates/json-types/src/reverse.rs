//! Reverse conversion: JSON value → Value.
//!
//! This is the inverse of [`value_to_json`](crate::value_to_json). Numbers are
//! range-checked against the target primitive; everything else must match the
//! shape the schema dictates.

use crate::error::{json_kind, JsonConversionError};
use crate::forward::is_object_key;
use crate::{TYPE_DISCRIMINATOR, VALUE_MEMBER};
use schema_core::{PrimitiveKind, Schema, SchemaKind, UnionSchema, Value};

/// JSON value paired with schema information for type-aware conversion.
#[derive(Debug, Clone)]
pub struct JsonValueWithSchema<'a> {
    /// The JSON value.
    pub value: serde_json::Value,
    /// The schema guiding conversion.
    pub schema: &'a Schema,
}

impl<'a> JsonValueWithSchema<'a> {
    /// Create a new JsonValueWithSchema.
    pub fn new(value: serde_json::Value, schema: &'a Schema) -> Self {
        Self { value, schema }
    }

    /// Convert to a schema-core Value.
    pub fn to_value(&self) -> Result<Value, JsonConversionError> {
        json_to_value(self.schema, &self.value)
    }
}

/// Convert JSON to a value following its schema.
pub fn json_to_value(schema: &Schema, json: &serde_json::Value) -> Result<Value, JsonConversionError> {
    convert(schema, json, "$")
}

/// Parse JSON text and convert it following the schema.
pub fn json_str_to_value(schema: &Schema, text: &str) -> Result<Value, JsonConversionError> {
    let json: serde_json::Value = serde_json::from_str(text)?;
    json_to_value(schema, &json)
}

fn convert(schema: &Schema, json: &serde_json::Value, path: &str) -> Result<Value, JsonConversionError> {
    if json.is_null() {
        return if schema.nullable {
            Ok(Value::Null)
        } else {
            Err(JsonConversionError::mismatch(path, schema.describe(), "null"))
        };
    }

    let mismatch = || JsonConversionError::mismatch(path, schema.describe(), json_kind(json));

    match &schema.kind {
        SchemaKind::Primitive(kind) => primitive(*kind, json, path),

        SchemaKind::Enum(e) => {
            let name = json.as_str().ok_or_else(mismatch)?;
            if e.contains(name) {
                Ok(Value::Enum(name.to_string()))
            } else {
                Err(JsonConversionError::UnknownVariant {
                    path: path.to_string(),
                    tag: name.to_string(),
                })
            }
        }

        SchemaKind::List(element) => {
            let items = json.as_array().ok_or_else(mismatch)?;
            items
                .iter()
                .enumerate()
                .map(|(i, item)| convert(element, item, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }

        SchemaKind::Map { key, value } => {
            if is_object_key(key) {
                let object = json.as_object().ok_or_else(mismatch)?;
                let mut entries = Vec::with_capacity(object.len());
                for (name, member) in object {
                    let k = key_from_string(key, name, path)?;
                    let v = convert(value, member, &format!("{path}.{name}"))?;
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            } else {
                let pairs = json.as_array().ok_or_else(mismatch)?;
                let mut entries = Vec::with_capacity(pairs.len());
                for (i, pair) in pairs.iter().enumerate() {
                    let entry_path = format!("{path}[{i}]");
                    match pair.as_array().map(Vec::as_slice) {
                        Some([k, v]) => entries.push((
                            convert(key, k, &entry_path)?,
                            convert(value, v, &entry_path)?,
                        )),
                        _ => {
                            return Err(JsonConversionError::mismatch(
                                &entry_path,
                                "[key, value] pair",
                                json_kind(pair),
                            ))
                        }
                    }
                }
                Ok(Value::Map(entries))
            }
        }

        SchemaKind::Record(record) => {
            let object = json.as_object().ok_or_else(mismatch)?;
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let field_path = format!("{path}.{}", field.name);
                match object.get(&field.name) {
                    Some(member) => fields.push(convert(&field.schema, member, &field_path)?),
                    None if field.schema.nullable => fields.push(Value::Null),
                    None if matches!(field.schema.kind, SchemaKind::Singleton(_)) => {
                        fields.push(Value::Singleton)
                    }
                    None => {
                        return Err(JsonConversionError::MissingField {
                            path: path.to_string(),
                            field: field.name.clone(),
                        })
                    }
                }
            }
            Ok(Value::Record(fields))
        }

        SchemaKind::Sealed(union) | SchemaKind::Open(union) => variant(union, json, path),

        SchemaKind::Singleton(_) => {
            json.as_object().ok_or_else(mismatch)?;
            Ok(Value::Singleton)
        }
    }
}

fn primitive(kind: PrimitiveKind, json: &serde_json::Value, path: &str) -> Result<Value, JsonConversionError> {
    let mismatch = || JsonConversionError::mismatch(path, kind.name(), json_kind(json));

    match kind {
        PrimitiveKind::Bool => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
        PrimitiveKind::Byte => integer(json, kind, path).and_then(|i| narrow(i, kind, path).map(Value::Byte)),
        PrimitiveKind::Short => integer(json, kind, path).and_then(|i| narrow(i, kind, path).map(Value::Short)),
        PrimitiveKind::Int => integer(json, kind, path).and_then(|i| narrow(i, kind, path).map(Value::Int)),
        PrimitiveKind::Long => integer(json, kind, path).map(Value::Long),
        PrimitiveKind::Float => json.as_f64().map(|f| Value::Float(f as f32)).ok_or_else(mismatch),
        PrimitiveKind::Double => json.as_f64().map(Value::Double).ok_or_else(mismatch),
        PrimitiveKind::Char => {
            let s = json.as_str().ok_or_else(mismatch)?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(JsonConversionError::mismatch(path, "single character", format!("'{s}'"))),
            }
        }
        PrimitiveKind::String => json
            .as_str()
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(mismatch),
    }
}

fn integer(json: &serde_json::Value, kind: PrimitiveKind, path: &str) -> Result<i64, JsonConversionError> {
    json.as_i64()
        .ok_or_else(|| JsonConversionError::mismatch(path, kind.name(), json.to_string()))
}

fn narrow<T: TryFrom<i64>>(value: i64, kind: PrimitiveKind, path: &str) -> Result<T, JsonConversionError> {
    T::try_from(value).map_err(|_| JsonConversionError::OutOfRange {
        path: path.to_string(),
        value: value.to_string(),
        expected: kind.name().to_string(),
    })
}

fn variant(union: &UnionSchema, json: &serde_json::Value, path: &str) -> Result<Value, JsonConversionError> {
    let object = json
        .as_object()
        .ok_or_else(|| JsonConversionError::mismatch(path, format!("union {}", union.name), json_kind(json)))?;
    let tag = object
        .get(TYPE_DISCRIMINATOR)
        .and_then(|t| t.as_str())
        .ok_or_else(|| JsonConversionError::MissingField {
            path: path.to_string(),
            field: TYPE_DISCRIMINATOR.to_string(),
        })?;
    let index = union
        .variant_index(tag)
        .ok_or_else(|| JsonConversionError::UnknownVariant {
            path: path.to_string(),
            tag: tag.to_string(),
        })?;
    let variant_schema = &union.variants[index].schema;
    let variant_path = format!("{path}<{tag}>");

    let value = match &variant_schema.kind {
        SchemaKind::Record(_) => {
            let mut members = object.clone();
            members.remove(TYPE_DISCRIMINATOR);
            convert(variant_schema, &serde_json::Value::Object(members), &variant_path)?
        }
        SchemaKind::Singleton(_) => Value::Singleton,
        _ => {
            let member = object.get(VALUE_MEMBER).ok_or_else(|| JsonConversionError::MissingField {
                path: variant_path.clone(),
                field: VALUE_MEMBER.to_string(),
            })?;
            convert(variant_schema, member, &variant_path)?
        }
    };
    Ok(Value::Variant {
        tag: tag.to_string(),
        value: Box::new(value),
    })
}

fn key_from_string(schema: &Schema, name: &str, path: &str) -> Result<Value, JsonConversionError> {
    match &schema.kind {
        SchemaKind::Primitive(PrimitiveKind::String | PrimitiveKind::Char) | SchemaKind::Enum(_) => {
            convert(schema, &serde_json::Value::String(name.to_string()), path)
        }
        _ => {
            let json: serde_json::Value = serde_json::from_str(name).map_err(|_| {
                JsonConversionError::mismatch(path, format!("{} key", schema.describe()), format!("'{name}'"))
            })?;
            convert(schema, &json, path)
        }
    }
}
