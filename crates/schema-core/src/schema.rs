//! Schema documents.
//!
//! A schema document is a YAML file holding one root [`Schema`]:
//!
//! ```yaml
//! version: 1
//! root:
//!   type: list
//!   element:
//!     type: record
//!     name: Row
//!     fields:
//!       - { name: id, type: int }
//!       - { name: label, type: string? }
//! ```

use crate::types::{Schema, SchemaKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Structurally invalid schema
    #[error("Invalid schema at '{path}': {reason}")]
    Invalid { path: String, reason: String },
}

// ============================================================================
// Documents
// ============================================================================

fn default_version() -> u32 {
    1
}

/// A root schema with its document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    pub root: Schema,
}

impl SchemaDocument {
    pub fn new(root: Schema) -> Self {
        Self {
            version: default_version(),
            root,
        }
    }

    /// Load and validate a schema document from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a schema document from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let document: SchemaDocument = serde_yaml::from_str(yaml)?;
        validate(&document.root, "$")?;
        Ok(document)
    }

    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Check names are unique and enums/unions are non-empty, recursively.
pub fn validate(schema: &Schema, path: &str) -> Result<(), SchemaError> {
    let invalid = |reason: String| SchemaError::Invalid {
        path: path.to_string(),
        reason,
    };

    match &schema.kind {
        SchemaKind::Primitive(_) | SchemaKind::Singleton(_) => Ok(()),
        SchemaKind::List(element) => validate(element, &format!("{path}[]")),
        SchemaKind::Map { key, value } => {
            validate(key, &format!("{path}{{key}}"))?;
            validate(value, &format!("{path}{{value}}"))
        }
        SchemaKind::Record(record) => {
            let mut seen = HashSet::new();
            for field in &record.fields {
                if field.name.is_empty() {
                    return Err(invalid(format!("record {} has an unnamed field", record.name)));
                }
                if !seen.insert(field.name.as_str()) {
                    return Err(invalid(format!(
                        "duplicate field '{}' in record {}",
                        field.name, record.name
                    )));
                }
                validate(&field.schema, &format!("{path}.{}", field.name))?;
            }
            Ok(())
        }
        SchemaKind::Enum(e) => {
            if e.values.is_empty() {
                return Err(invalid(format!("enum {} has no values", e.name)));
            }
            let mut seen = HashSet::new();
            for value in &e.values {
                if !seen.insert(value.as_str()) {
                    return Err(invalid(format!("duplicate value '{value}' in enum {}", e.name)));
                }
            }
            Ok(())
        }
        SchemaKind::Sealed(union) | SchemaKind::Open(union) => {
            if union.variants.is_empty() {
                return Err(invalid(format!("union {} has no variants", union.name)));
            }
            let mut seen = HashSet::new();
            for variant in &union.variants {
                if !seen.insert(variant.tag.as_str()) {
                    return Err(invalid(format!(
                        "duplicate tag '{}' in union {}",
                        variant.tag, union.name
                    )));
                }
                validate(&variant.schema, &format!("{path}<{}>", variant.tag))?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;
    use std::io::Write;

    #[test]
    fn test_document_from_yaml() {
        let yaml = r#"
version: 1
root:
  type: list
  element:
    type: record
    name: Row
    fields:
      - { name: id, type: int }
      - { name: label, type: string? }
"#;
        let document = SchemaDocument::from_yaml(yaml).unwrap();
        assert_eq!(document.version, 1);
        assert_eq!(
            document.root,
            Schema::list(Schema::record(
                "Row",
                vec![
                    Field::new("id", Schema::int()),
                    Field::new("label", Schema::string().nullable()),
                ],
            ))
        );
    }

    #[test]
    fn test_version_defaults_to_one() {
        let document = SchemaDocument::from_yaml("root: int").unwrap();
        assert_eq!(document.version, 1);
        assert_eq!(document.root, Schema::int());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let yaml = r#"
root:
  type: record
  name: Row
  fields:
    - { name: id, type: int }
    - { name: id, type: long }
"#;
        let err = SchemaDocument::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, SchemaError::Invalid { .. }));
        assert!(err.to_string().contains("duplicate field 'id'"));
    }

    #[test]
    fn test_empty_enum_rejected() {
        let yaml = "root: { type: enum, name: Color, values: [] }";
        let err = SchemaDocument::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("enum Color has no values"));
    }

    #[test]
    fn test_nested_error_path() {
        let yaml = r#"
root:
  type: record
  name: Outer
  fields:
    - name: inner
      type:
        type: sealed
        name: Choice
        variants:
          - tag: A
          - tag: A
"#;
        let err = SchemaDocument::from_yaml(yaml).unwrap_err();
        match err {
            SchemaError::Invalid { path, .. } => assert_eq!(path, "$.inner"),
            other => panic!("expected invalid schema error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let err = SchemaDocument::from_yaml("root: [unclosed").unwrap_err();
        assert!(matches!(err, SchemaError::YamlError(_)));
    }

    #[test]
    fn test_from_file_and_back() {
        let document = SchemaDocument::new(Schema::map(Schema::string(), Schema::long()));
        let yaml = document.to_yaml().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let loaded = SchemaDocument::from_file(file.path()).unwrap();
        assert_eq!(document, loaded);
    }

    #[test]
    fn test_missing_file() {
        let err = SchemaDocument::from_file("/nonexistent/schema.yaml").unwrap_err();
        assert!(matches!(err, SchemaError::IoError(_)));
    }
}
