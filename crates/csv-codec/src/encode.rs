//! Encoder: walks a schema and a value together and prints columns.

use crate::deferred::deferred_codec;
use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::forward::format_primitive;
use crate::headers;
use crate::writer::CsvWriter;
use crate::{render_path, Position};
use schema_core::{Schema, SchemaKind, UnionSchema, Value};
use std::fmt::Write;
use tracing::{debug, trace};

pub(crate) struct Encoder<'d, W> {
    writer: CsvWriter<'d, W>,
    dialect: &'d Dialect,
    path: Vec<String>,
}

impl<'d, W: Write> Encoder<'d, W> {
    pub(crate) fn new(sink: W, dialect: &'d Dialect) -> Self {
        Self {
            writer: CsvWriter::new(sink, dialect),
            dialect,
            path: Vec::new(),
        }
    }

    /// Encode `value` as the whole output and hand back the sink.
    pub(crate) fn encode(mut self, schema: &Schema, value: &Value) -> Result<W> {
        match &schema.kind {
            SchemaKind::List(element) => self.encode_records(schema, element, value)?,
            _ => {
                if self.dialect.has_header_record {
                    self.print_header(schema)?;
                }
                self.writer.begin_record()?;
                self.encode_value(schema, value, Position::Root)?;
                self.writer.end_record()?;
            }
        }
        Ok(self.writer.into_inner())
    }

    fn encode_records(&mut self, schema: &Schema, element: &Schema, value: &Value) -> Result<()> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(self.mismatch(schema, other)),
        };
        for (index, item) in items.iter().enumerate() {
            if index == 0 && self.dialect.has_header_record {
                self.print_header(element)?;
            }
            trace!("Encoding record {}", index);
            self.writer.begin_record()?;
            self.with_path(format!("[{index}]"), |e| {
                e.encode_value(element, item, Position::Row)
            })?;
            self.writer.end_record()?;
        }
        debug!("Encoded {} records", items.len());
        Ok(())
    }

    fn print_header(&mut self, schema: &Schema) -> Result<()> {
        let names = headers::root_header_names(schema, self.dialect)?;
        self.writer.begin_record()?;
        for name in &names {
            self.writer.print_column(name, false, false)?;
        }
        self.writer.end_record()
    }

    fn with_path<T>(
        &mut self,
        segment: impl Into<String>,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.path.push(segment.into());
        let result = f(self);
        self.path.pop();
        result
    }

    fn mismatch(&self, schema: &Schema, found: &Value) -> CsvError {
        CsvError::ValueMismatch {
            path: render_path(&self.path),
            expected: schema.describe(),
            found: found.kind_name().to_string(),
        }
    }

    fn print_null(&mut self) -> Result<()> {
        self.writer.print_column(&self.dialect.null_string, false, true)
    }

    fn print_length(&mut self, len: usize) -> Result<()> {
        self.writer.print_column(&len.to_string(), true, false)
    }

    fn encode_value(&mut self, schema: &Schema, value: &Value, position: Position) -> Result<()> {
        if value.is_null() {
            return self.encode_null(schema, position);
        }

        if let Some(codec) = deferred_codec(self.dialect, schema) {
            let text = codec
                .encode_to_string(schema, value)
                .map_err(|source| CsvError::Deferred {
                    path: render_path(&self.path),
                    source,
                })?;
            return self.writer.print_column(&text, false, false);
        }

        match (&schema.kind, value) {
            (SchemaKind::Primitive(kind), _) => {
                let text = format_primitive(*kind, value).ok_or_else(|| self.mismatch(schema, value))?;
                self.writer.print_column(text.as_str(), kind.is_numeric(), false)
            }
            (SchemaKind::Enum(enumeration), Value::Enum(name)) => {
                if !enumeration.contains(name) {
                    return Err(self.mismatch(schema, value));
                }
                self.writer.print_column(name, false, false)
            }
            (SchemaKind::Record(record), Value::Record(fields)) => {
                if fields.len() != record.fields.len() {
                    return Err(self.mismatch(schema, value));
                }
                if schema.nullable && position == Position::Nested {
                    self.writer.print_column("true", false, false)?;
                }
                for (field, field_value) in record.fields.iter().zip(fields) {
                    self.with_path(&field.name, |e| {
                        e.encode_value(&field.schema, field_value, Position::Nested)
                    })?;
                }
                Ok(())
            }
            (SchemaKind::List(element), Value::List(items)) => {
                if position != Position::Row {
                    self.print_length(items.len())?;
                }
                for (index, item) in items.iter().enumerate() {
                    self.with_path(format!("[{index}]"), |e| {
                        e.encode_value(element, item, Position::Nested)
                    })?;
                }
                Ok(())
            }
            (SchemaKind::Map { key, value: map_value }, Value::Map(entries)) => {
                if position != Position::Row {
                    self.print_length(entries.len())?;
                }
                for (index, (k, v)) in entries.iter().enumerate() {
                    self.with_path(format!("[{index}]"), |e| {
                        e.encode_value(key, k, Position::Nested)?;
                        e.encode_value(map_value, v, Position::Nested)
                    })?;
                }
                Ok(())
            }
            (SchemaKind::Sealed(union), Value::Variant { tag, value: inner }) => {
                let active = self.variant_index(union, schema, value, tag)?;
                self.writer.print_column(tag, false, false)?;
                for (index, variant) in union.variants.iter().enumerate() {
                    self.with_path(&variant.tag, |e| {
                        if index == active {
                            e.encode_value(&variant.schema, inner, Position::Nested)
                        } else {
                            e.write_nulls(&variant.schema)
                        }
                    })?;
                }
                Ok(())
            }
            (SchemaKind::Open(union), Value::Variant { tag, value: inner }) => {
                let active = self.variant_index(union, schema, value, tag)?;
                let variant = &union.variants[active];
                self.writer.print_column(tag, false, false)?;
                self.with_path(&variant.tag, |e| {
                    e.encode_value(&variant.schema, inner, Position::Nested)
                })
            }
            (SchemaKind::Singleton(_), Value::Singleton) => Ok(()),
            _ => Err(self.mismatch(schema, value)),
        }
    }

    fn variant_index(&self, union: &UnionSchema, schema: &Schema, value: &Value, tag: &str) -> Result<usize> {
        union
            .variant_index(tag)
            .ok_or_else(|| self.mismatch(schema, value))
    }

    fn encode_null(&mut self, schema: &Schema, position: Position) -> Result<()> {
        if !schema.nullable {
            return Err(self.mismatch(schema, &Value::Null));
        }
        if deferred_codec(self.dialect, schema).is_some() {
            return self.print_null();
        }
        match &schema.kind {
            SchemaKind::Record(record) if position == Position::Nested => {
                self.writer.print_column("false", false, false)?;
                for field in &record.fields {
                    self.with_path(&field.name, |e| e.write_nulls(&field.schema))?;
                }
                Ok(())
            }
            SchemaKind::Sealed(_) => self.write_nulls(schema),
            // Takes no columns, so absence cannot be recorded.
            SchemaKind::Singleton(_) => Ok(()),
            _ => self.print_null(),
        }
    }

    /// Fill the columns a node would occupy with null tokens.
    fn write_nulls(&mut self, schema: &Schema) -> Result<()> {
        if deferred_codec(self.dialect, schema).is_some() {
            return self.print_null();
        }
        match &schema.kind {
            SchemaKind::Singleton(_) => Ok(()),
            SchemaKind::Record(record) => {
                if schema.nullable {
                    self.print_null()?;
                }
                for field in &record.fields {
                    self.with_path(&field.name, |e| e.write_nulls(&field.schema))?;
                }
                Ok(())
            }
            SchemaKind::Sealed(union) => {
                self.print_null()?;
                for variant in &union.variants {
                    self.with_path(&variant.tag, |e| e.write_nulls(&variant.schema))?;
                }
                Ok(())
            }
            _ => self.print_null(),
        }
    }
}
