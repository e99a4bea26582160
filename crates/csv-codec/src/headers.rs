//! Header rows: naming columns on encode, resolving them on decode.
//!
//! Nested record fields are named by joining field names with the dialect's
//! header separator (`data.location.lat`). A nullable nested record adds a
//! column named after the field itself for its presence flag. Sealed unions
//! are named `field` for the discriminant and `field.Tag.leaf` for variant
//! leaves, and are always read back positionally.

use crate::deferred::deferred_codec;
use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::reader::CsvReader;
use crate::source::Source;
use schema_core::{RecordSchema, Schema, SchemaKind};
use tracing::{debug, warn};

/// Header column of a root or record-collection value that is not a record.
pub const VALUE_HEADER: &str = "value";

/// Header column of a root or record-collection sealed union's discriminant.
pub const TYPE_HEADER: &str = "type";

/// Column layout of one record, in physical order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HeaderTable {
    entries: Vec<HeaderEntry>,
}

/// What one header position holds.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderEntry {
    /// Column ignored on decode.
    Unknown,
    /// A field read in place, spanning as many columns as its schema needs.
    Field { index: usize },
    /// A nested record whose own columns follow, in their own order.
    Nested {
        index: usize,
        /// Whether a presence column precedes the nested columns.
        presence: bool,
        headers: HeaderTable,
    },
}

impl HeaderTable {
    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append `entry`, refusing a second binding of the same field.
    fn bind(&mut self, entry: HeaderEntry, name: &str, offset: usize) -> Result<()> {
        if let Some(index) = entry.field_index() {
            if self.entries.iter().any(|e| e.field_index() == Some(index)) {
                return Err(CsvError::DuplicateHeaderColumn {
                    name: name.to_string(),
                    offset,
                });
            }
        }
        self.entries.push(entry);
        Ok(())
    }
}

impl HeaderEntry {
    fn field_index(&self) -> Option<usize> {
        match self {
            HeaderEntry::Unknown => None,
            HeaderEntry::Field { index } | HeaderEntry::Nested { index, .. } => Some(*index),
        }
    }
}

fn unsupported(schema: &Schema, path: &str) -> CsvError {
    CsvError::UnsupportedSchemaKind {
        kind: schema.kind_name().to_string(),
        path: path.to_string(),
        reason: "variable-width values need a deferred codec to appear under a header".to_string(),
    }
}

// ============================================================================
// Naming (encode)
// ============================================================================

/// Header names for a value at the root or in record-collection position.
pub fn root_header_names(schema: &Schema, dialect: &Dialect) -> Result<Vec<String>> {
    let mut names = Vec::new();
    if deferred_codec(dialect, schema).is_some() {
        names.push(VALUE_HEADER.to_string());
        return Ok(names);
    }
    match &schema.kind {
        SchemaKind::Record(record) => {
            for field in &record.fields {
                node_names(&field.schema, &field.name, dialect, &mut names)?;
            }
        }
        SchemaKind::Sealed(union) => {
            names.push(TYPE_HEADER.to_string());
            for variant in &union.variants {
                node_names(&variant.schema, &variant.tag, dialect, &mut names)?;
            }
        }
        SchemaKind::List(_) | SchemaKind::Map { .. } | SchemaKind::Open(_) => {
            return Err(unsupported(schema, "$"));
        }
        SchemaKind::Singleton(_) => {}
        _ => names.push(VALUE_HEADER.to_string()),
    }
    Ok(names)
}

/// Names for a node laid out inline under `name`.
fn node_names(schema: &Schema, name: &str, dialect: &Dialect, names: &mut Vec<String>) -> Result<()> {
    if deferred_codec(dialect, schema).is_some() {
        names.push(name.to_string());
        return Ok(());
    }
    let sep = &dialect.header_separator;
    match &schema.kind {
        SchemaKind::List(_) | SchemaKind::Map { .. } | SchemaKind::Open(_) => {
            return Err(unsupported(schema, name));
        }
        SchemaKind::Singleton(_) => {}
        SchemaKind::Record(record) => {
            if schema.nullable {
                names.push(name.to_string());
            }
            for field in &record.fields {
                node_names(&field.schema, &format!("{name}{sep}{}", field.name), dialect, names)?;
            }
        }
        SchemaKind::Sealed(union) => {
            names.push(name.to_string());
            for variant in &union.variants {
                node_names(&variant.schema, &format!("{name}{sep}{}", variant.tag), dialect, names)?;
            }
        }
        _ => names.push(name.to_string()),
    }
    Ok(())
}

// ============================================================================
// Resolution (decode)
// ============================================================================

/// Read the header row and map its columns onto `record`.
///
/// On failure the reader is rewound to where the header row started.
pub fn read_header_table<S: Source>(
    reader: &mut CsvReader<'_, S>,
    dialect: &Dialect,
    record: &RecordSchema,
) -> Result<HeaderTable> {
    reader.mark();
    match resolve(reader, dialect, record, "") {
        Ok(table) => {
            reader.unmark();
            debug!(
                "Resolved header row for record {} into {} positions",
                record.name,
                table.len()
            );
            Ok(table)
        }
        Err(e) => {
            reader.reset();
            Err(e)
        }
    }
}

/// Read one header token under a mark the caller must resolve.
fn read_marked<S: Source>(reader: &mut CsvReader<'_, S>) -> Result<String> {
    reader.mark();
    reader.read_column().inspect_err(|_| reader.reset())
}

fn resolve<S: Source>(
    reader: &mut CsvReader<'_, S>,
    dialect: &Dialect,
    record: &RecordSchema,
    prefix: &str,
) -> Result<HeaderTable> {
    let sep = dialect.header_separator.as_str();
    let mut table = HeaderTable::default();

    while !reader.is_done() && reader.is_first_record() {
        let offset = reader.offset();
        let token = read_marked(reader)?;
        let Some(rest) = token.strip_prefix(prefix) else {
            // Belongs to an enclosing record.
            reader.reset();
            break;
        };

        if let Some(index) = record.field_index(rest) {
            let schema = &record.fields[index].schema;
            match &schema.kind {
                SchemaKind::Record(nested) if schema.nullable => {
                    reader.unmark();
                    let headers = resolve(reader, dialect, nested, &format!("{token}{sep}"))?;
                    let entry = HeaderEntry::Nested {
                        index,
                        presence: true,
                        headers,
                    };
                    table.bind(entry, &token, offset)?;
                    continue;
                }
                SchemaKind::Sealed(_) => {
                    reader.unmark();
                    skip_block(reader, &format!("{token}{sep}"))?;
                    table.bind(HeaderEntry::Field { index }, &token, offset)?;
                    continue;
                }
                // Neither has a column of its own.
                SchemaKind::Record(_) | SchemaKind::Singleton(_) => {}
                _ if schema.is_variable_width() && deferred_codec(dialect, schema).is_none() => {
                    reader.reset();
                    return Err(unsupported(schema, &token));
                }
                _ => {
                    reader.unmark();
                    table.bind(HeaderEntry::Field { index }, &token, offset)?;
                    continue;
                }
            }
        }

        if let Some((head, _)) = rest.split_once(sep) {
            if let Some(index) = record.field_index(head) {
                if let SchemaKind::Record(nested) = &record.fields[index].schema.kind {
                    // Let the nested resolver read this token again.
                    reader.reset();
                    let headers = resolve(reader, dialect, nested, &format!("{prefix}{head}{sep}"))?;
                    let entry = HeaderEntry::Nested {
                        index,
                        presence: false,
                        headers,
                    };
                    table.bind(entry, &token, offset)?;
                    continue;
                }
            }
        }

        let closes_row = !reader.is_first_record() || reader.is_done();
        if token.is_empty() && dialect.has_trailing_delimiter && closes_row {
            reader.unmark();
        } else if dialect.ignore_unknown_columns {
            reader.unmark();
            warn!("Ignoring unknown column header '{}' at offset {}", token, offset);
            table.entries.push(HeaderEntry::Unknown);
        } else {
            reader.reset();
            return Err(CsvError::UnknownHeaderColumn {
                name: token,
                offset,
            });
        }
    }

    Ok(table)
}

/// Consume the header tokens of a positional block starting with `prefix`.
fn skip_block<S: Source>(reader: &mut CsvReader<'_, S>, prefix: &str) -> Result<()> {
    while !reader.is_done() && reader.is_first_record() {
        let token = read_marked(reader)?;
        if token.starts_with(prefix) {
            reader.unmark();
        } else {
            reader.reset();
            break;
        }
    }
    Ok(())
}
