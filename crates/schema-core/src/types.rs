//! Schema descriptors.
//!
//! A [`Schema`] describes the shape of a [`Value`](crate::Value): which kind of
//! node it is and whether it may be null. Schemas are immutable once built and
//! are shared by reference across every recursive encode/decode step.
//!
//! ## YAML format
//!
//! Primitive schemas are written as plain strings, with a trailing `?` for
//! nullable ones:
//!
//! ```yaml
//! int
//! string?
//! ```
//!
//! Structured schemas use a map with a `type` key:
//!
//! ```yaml
//! type: record
//! name: Location
//! fields:
//!   - name: lat
//!     type: double
//!   - name: label
//!     type: string
//!     nullable: true
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Primitive leaf kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    /// 8-bit signed integer
    Byte,
    /// 16-bit signed integer
    Short,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit floating point
    Float,
    /// 64-bit floating point
    Double,
    Char,
    String,
}

impl PrimitiveKind {
    /// The name used for this kind in schema documents.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::String => "string",
        }
    }

    /// Parse a kind from its schema-document name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" | "boolean" => Some(Self::Bool),
            "byte" | "tiny_int" => Some(Self::Byte),
            "short" | "small_int" => Some(Self::Short),
            "int" => Some(Self::Int),
            "long" | "big_int" => Some(Self::Long),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "char" => Some(Self::Char),
            "string" | "text" => Some(Self::String),
            _ => None,
        }
    }

    /// Whether values of this kind are written as numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named field of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldDef")]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub schema: Schema,
}

impl Field {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// On-disk form of a field; `nullable` may be given next to the type.
#[derive(Deserialize)]
struct FieldDef {
    name: String,
    #[serde(rename = "type")]
    schema: Schema,
    #[serde(default)]
    nullable: bool,
}

impl From<FieldDef> for Field {
    fn from(def: FieldDef) -> Self {
        let mut schema = def.schema;
        schema.nullable |= def.nullable;
        Field {
            name: def.name,
            schema,
        }
    }
}

/// An ordered set of named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<Field>,
}

impl RecordSchema {
    /// Index of the field called `name`, if any.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumSchema {
    pub name: String,
    pub values: Vec<String>,
}

impl EnumSchema {
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// One alternative of a tagged union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VariantDef")]
pub struct Variant {
    /// Fully qualified tag written to the discriminant column.
    pub tag: String,
    #[serde(rename = "type")]
    pub schema: Schema,
}

impl Variant {
    pub fn new(tag: impl Into<String>, schema: Schema) -> Self {
        Self {
            tag: tag.into(),
            schema,
        }
    }

    /// A variant without payload.
    pub fn singleton(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let schema = Schema::singleton(tag.clone());
        Self { tag, schema }
    }
}

#[derive(Deserialize)]
struct VariantDef {
    tag: String,
    #[serde(rename = "type", default)]
    schema: Option<Schema>,
}

impl From<VariantDef> for Variant {
    fn from(def: VariantDef) -> Self {
        match def.schema {
            Some(schema) => Variant::new(def.tag, schema),
            None => Variant::singleton(def.tag),
        }
    }
}

/// Ordered variants of a sealed or open union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionSchema {
    pub name: String,
    pub variants: Vec<Variant>,
}

impl UnionSchema {
    pub fn variant_index(&self, tag: &str) -> Option<usize> {
        self.variants.iter().position(|v| v.tag == tag)
    }
}

/// The shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    Primitive(PrimitiveKind),
    List(Box<Schema>),
    Map { key: Box<Schema>, value: Box<Schema> },
    Record(RecordSchema),
    Enum(EnumSchema),
    /// Closed union: every variant's columns are always laid out.
    Sealed(UnionSchema),
    /// Open union: only the active variant's columns are laid out.
    Open(UnionSchema),
    /// Named value without payload.
    Singleton(String),
}

/// Structural description of a value.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub kind: SchemaKind,
    pub nullable: bool,
}

impl Schema {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::new(SchemaKind::Primitive(kind))
    }

    pub fn bool() -> Self {
        Self::primitive(PrimitiveKind::Bool)
    }

    pub fn byte() -> Self {
        Self::primitive(PrimitiveKind::Byte)
    }

    pub fn short() -> Self {
        Self::primitive(PrimitiveKind::Short)
    }

    pub fn int() -> Self {
        Self::primitive(PrimitiveKind::Int)
    }

    pub fn long() -> Self {
        Self::primitive(PrimitiveKind::Long)
    }

    pub fn float() -> Self {
        Self::primitive(PrimitiveKind::Float)
    }

    pub fn double() -> Self {
        Self::primitive(PrimitiveKind::Double)
    }

    pub fn char() -> Self {
        Self::primitive(PrimitiveKind::Char)
    }

    pub fn string() -> Self {
        Self::primitive(PrimitiveKind::String)
    }

    pub fn list(element: Schema) -> Self {
        Self::new(SchemaKind::List(Box::new(element)))
    }

    pub fn map(key: Schema, value: Schema) -> Self {
        Self::new(SchemaKind::Map {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn record(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(SchemaKind::Record(RecordSchema {
            name: name.into(),
            fields,
        }))
    }

    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(SchemaKind::Enum(EnumSchema {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }))
    }

    pub fn sealed(name: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self::new(SchemaKind::Sealed(UnionSchema {
            name: name.into(),
            variants,
        }))
    }

    pub fn open(name: impl Into<String>, variants: Vec<Variant>) -> Self {
        Self::new(SchemaKind::Open(UnionSchema {
            name: name.into(),
            variants,
        }))
    }

    pub fn singleton(name: impl Into<String>) -> Self {
        Self::new(SchemaKind::Singleton(name.into()))
    }

    /// Mark this schema as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn as_record(&self) -> Option<&RecordSchema> {
        match &self.kind {
            SchemaKind::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self.kind, SchemaKind::Record(_))
    }

    /// Whether this node occupies a variable number of columns when laid
    /// out inline (lists, maps and open unions).
    pub fn is_variable_width(&self) -> bool {
        matches!(
            self.kind,
            SchemaKind::List(_) | SchemaKind::Map { .. } | SchemaKind::Open(_)
        )
    }

    /// Short human-readable name of the kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            SchemaKind::Primitive(p) => p.name(),
            SchemaKind::List(_) => "list",
            SchemaKind::Map { .. } => "map",
            SchemaKind::Record(_) => "record",
            SchemaKind::Enum(_) => "enum",
            SchemaKind::Sealed(_) => "sealed",
            SchemaKind::Open(_) => "open",
            SchemaKind::Singleton(_) => "singleton",
        }
    }

    /// Human-readable description including the type name where one exists.
    pub fn describe(&self) -> String {
        let base = match &self.kind {
            SchemaKind::Record(r) => format!("record {}", r.name),
            SchemaKind::Enum(e) => format!("enum {}", e.name),
            SchemaKind::Sealed(u) | SchemaKind::Open(u) => {
                format!("{} {}", self.kind_name(), u.name)
            }
            SchemaKind::Singleton(name) => format!("singleton {name}"),
            _ => self.kind_name().to_string(),
        };
        if self.nullable {
            format!("{base}?")
        } else {
            base
        }
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        if let SchemaKind::Primitive(p) = &self.kind {
            // Simple types - serialize as string
            return if self.nullable {
                serializer.serialize_str(&format!("{}?", p.name()))
            } else {
                serializer.serialize_str(p.name())
            };
        }

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", self.kind_name())?;
        if self.nullable {
            map.serialize_entry("nullable", &true)?;
        }
        match &self.kind {
            SchemaKind::Primitive(_) => {}
            SchemaKind::List(element) => map.serialize_entry("element", element)?,
            SchemaKind::Map { key, value } => {
                map.serialize_entry("key", key)?;
                map.serialize_entry("value", value)?;
            }
            SchemaKind::Record(record) => {
                map.serialize_entry("name", &record.name)?;
                map.serialize_entry("fields", &record.fields)?;
            }
            SchemaKind::Enum(e) => {
                map.serialize_entry("name", &e.name)?;
                map.serialize_entry("values", &e.values)?;
            }
            SchemaKind::Sealed(u) | SchemaKind::Open(u) => {
                map.serialize_entry("name", &u.name)?;
                map.serialize_entry("variants", &u.variants)?;
            }
            SchemaKind::Singleton(name) => map.serialize_entry("name", name)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, MapAccess, Visitor};

        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or map representing a Schema")
            }

            // Handle string format: "int", "string?", etc.
            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                let (name, nullable) = match value.strip_suffix('?') {
                    Some(name) => (name, true),
                    None => (value, false),
                };
                let kind = PrimitiveKind::from_name(name)
                    .ok_or_else(|| E::custom(format!("unknown simple type: {value}")))?;
                Ok(Schema {
                    kind: SchemaKind::Primitive(kind),
                    nullable,
                })
            }

            // Handle map format: {"type": "list", "element": "int"}
            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut type_name: Option<String> = None;
                let mut fields: HashMap<String, serde_yaml::Value> = HashMap::new();

                while let Some(key) = map.next_key::<String>()? {
                    if key == "type" {
                        type_name = Some(map.next_value()?);
                    } else {
                        fields.insert(key, map.next_value()?);
                    }
                }

                let type_name = type_name.ok_or_else(|| M::Error::missing_field("type"))?;
                let nullable = get_field(&fields, "nullable").unwrap_or(false);

                let kind = match type_name.as_str() {
                    "list" | "array" => {
                        let element: Schema = get_field_required(&fields, "element")?;
                        SchemaKind::List(Box::new(element))
                    }
                    "map" => {
                        let key: Schema = get_field_required(&fields, "key")?;
                        let value: Schema = get_field_required(&fields, "value")?;
                        SchemaKind::Map {
                            key: Box::new(key),
                            value: Box::new(value),
                        }
                    }
                    "record" => SchemaKind::Record(RecordSchema {
                        name: get_field_required(&fields, "name")?,
                        fields: get_field_required(&fields, "fields")?,
                    }),
                    "enum" => SchemaKind::Enum(EnumSchema {
                        name: get_field_required(&fields, "name")?,
                        values: get_field_required(&fields, "values")?,
                    }),
                    "sealed" => SchemaKind::Sealed(UnionSchema {
                        name: get_field_required(&fields, "name")?,
                        variants: get_field_required(&fields, "variants")?,
                    }),
                    "open" => SchemaKind::Open(UnionSchema {
                        name: get_field_required(&fields, "name")?,
                        variants: get_field_required(&fields, "variants")?,
                    }),
                    "singleton" | "object" => {
                        SchemaKind::Singleton(get_field_required(&fields, "name")?)
                    }
                    other => match PrimitiveKind::from_name(other) {
                        // Simple types that might appear in map format
                        Some(kind) => SchemaKind::Primitive(kind),
                        None => return Err(M::Error::custom(format!("unknown type: {type_name}"))),
                    },
                };

                Ok(Schema { kind, nullable })
            }
        }

        deserializer.deserialize_any(SchemaVisitor)
    }
}

// Helper functions for deserialization
fn get_field<T: for<'de> Deserialize<'de>>(
    fields: &HashMap<String, serde_yaml::Value>,
    key: &str,
) -> Option<T> {
    fields
        .get(key)
        .and_then(|v| serde_yaml::from_value(v.clone()).ok())
}

fn get_field_required<T: for<'de> Deserialize<'de>, E: serde::de::Error>(
    fields: &HashMap<String, serde_yaml::Value>,
    key: &'static str,
) -> Result<T, E> {
    let value = fields.get(key).ok_or_else(|| E::missing_field(key))?;
    serde_yaml::from_value(value.clone())
        .map_err(|e| E::custom(format!("invalid field '{key}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_type_from_string() {
        let schema: Schema = serde_yaml::from_str("int").unwrap();
        assert_eq!(schema, Schema::int());

        let schema: Schema = serde_yaml::from_str("string?").unwrap();
        assert_eq!(schema, Schema::string().nullable());
    }

    #[test]
    fn test_simple_type_in_map_format() {
        let schema: Schema = serde_yaml::from_str("{ type: long, nullable: true }").unwrap();
        assert_eq!(schema, Schema::long().nullable());
    }

    #[test]
    fn test_unknown_simple_type() {
        let result: Result<Schema, _> = serde_yaml::from_str("decimal");
        assert!(result.is_err());
    }

    #[test]
    fn test_record_with_field_level_nullable() {
        let yaml = r#"
type: record
name: Data
fields:
  - name: speed
    type: int
  - name: info
    type: string
    nullable: true
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        let record = schema.as_record().unwrap();
        assert_eq!(record.name, "Data");
        assert_eq!(record.fields[0].schema, Schema::int());
        assert_eq!(record.fields[1].schema, Schema::string().nullable());
        assert_eq!(record.field_index("info"), Some(1));
        assert_eq!(record.field_index("missing"), None);
    }

    #[test]
    fn test_sealed_variant_without_type_is_singleton() {
        let yaml = r#"
type: sealed
name: Shape
variants:
  - tag: Shape.Empty
  - tag: Shape.Circle
    type:
      type: record
      name: Circle
      fields:
        - { name: radius, type: double }
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        let SchemaKind::Sealed(union) = &schema.kind else {
            panic!("expected sealed union, got {schema:?}");
        };
        assert_eq!(union.variants[0], Variant::singleton("Shape.Empty"));
        assert!(union.variants[1].schema.is_record());
        assert_eq!(union.variant_index("Shape.Circle"), Some(1));
    }

    #[test]
    fn test_schema_yaml_roundtrip() {
        let schema = Schema::record(
            "Everything",
            vec![
                Field::new("flag", Schema::bool()),
                Field::new("tags", Schema::list(Schema::string()).nullable()),
                Field::new("scores", Schema::map(Schema::string(), Schema::double())),
                Field::new("color", Schema::enumeration("Color", ["RED", "GREEN"])),
                Field::new(
                    "shape",
                    Schema::sealed(
                        "Shape",
                        vec![
                            Variant::singleton("Shape.None"),
                            Variant::new("Shape.Square", Schema::record("Square", vec![
                                Field::new("side", Schema::float()),
                            ])),
                        ],
                    ),
                ),
                Field::new("payload", Schema::open("Payload", vec![Variant::singleton("Ping")])),
                Field::new("unit", Schema::singleton("Unit")),
            ],
        );

        let yaml = serde_yaml::to_string(&schema).unwrap();
        let parsed: Schema = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(schema, parsed);
    }

    #[test]
    fn test_schema_from_json() {
        let schema: Schema =
            serde_json::from_str(r#"{"type": "list", "element": "int?"}"#).unwrap();
        assert_eq!(schema, Schema::list(Schema::int().nullable()));
    }

    #[test]
    fn test_describe() {
        assert_eq!(Schema::int().nullable().describe(), "int?");
        assert_eq!(
            Schema::record("Point", vec![]).describe(),
            "record Point"
        );
        assert!(Schema::list(Schema::int()).is_variable_width());
        assert!(!Schema::record("Point", vec![]).is_variable_width());
    }

    #[test]
    fn test_numeric_kinds() {
        assert!(PrimitiveKind::Byte.is_numeric());
        assert!(PrimitiveKind::Double.is_numeric());
        assert!(!PrimitiveKind::Bool.is_numeric());
        assert!(!PrimitiveKind::Char.is_numeric());
    }
}
