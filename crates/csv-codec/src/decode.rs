//! Decoder: walks a schema and pulls columns from the tokenizer.
//!
//! Every element of a record collection is confined to its own row; a read
//! that would cross into the next row fails instead of silently shifting
//! columns.

use crate::deferred::deferred_codec;
use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::headers::{self, HeaderEntry, HeaderTable};
use crate::reader::CsvReader;
use crate::reverse::{parse_primitive, CsvParseError};
use crate::source::Source;
use crate::{render_path, Position};
use schema_core::{PrimitiveKind, RecordSchema, Schema, SchemaKind, UnionSchema, Value};
use tracing::{debug, trace, warn};

pub(crate) struct Decoder<'d, S> {
    reader: CsvReader<'d, S>,
    dialect: &'d Dialect,
    path: Vec<String>,
    // Record number the current element started on.
    row: usize,
}

impl<'d, S: Source> Decoder<'d, S> {
    pub(crate) fn new(source: S, dialect: &'d Dialect) -> Self {
        Self {
            reader: CsvReader::new(source, dialect),
            dialect,
            path: Vec::new(),
            row: 0,
        }
    }

    /// Decode the whole input as one value of `schema`.
    pub(crate) fn decode(mut self, schema: &Schema) -> Result<Value> {
        match &schema.kind {
            SchemaKind::List(element) => self.decode_records(element),
            _ => self.decode_single(schema),
        }
    }

    fn decode_single(&mut self, schema: &Schema) -> Result<Value> {
        let headers = self.read_headers(schema)?;
        self.row = self.reader.record_no();
        let value = self.decode_value(schema, headers.as_ref(), Position::Root)?;
        self.finish_row()?;
        Ok(value)
    }

    fn decode_records(&mut self, element: &Schema) -> Result<Value> {
        self.skip_blank_lines()?;
        let headers = if self.reader.is_done() {
            None
        } else {
            self.read_headers(element)?
        };

        let mut items = Vec::new();
        loop {
            self.skip_blank_lines()?;
            if self.reader.is_done() {
                break;
            }
            self.row = self.reader.record_no();
            trace!("Decoding record {}", self.row);
            let index = items.len();
            let item = self.with_path(format!("[{index}]"), |d| {
                d.decode_value(element, headers.as_ref(), Position::Row)
            })?;
            self.finish_row()?;
            items.push(item);
        }

        debug!("Decoded {} records", items.len());
        Ok(Value::List(items))
    }

    fn read_headers(&mut self, schema: &Schema) -> Result<Option<HeaderTable>> {
        if !self.dialect.has_header_record {
            return Ok(None);
        }
        match schema.as_record() {
            Some(record) => {
                headers::read_header_table(&mut self.reader, self.dialect, record).map(Some)
            }
            None => {
                // Fails for layouts that cannot carry a header at all.
                headers::root_header_names(schema, self.dialect)?;
                let skipped = self.reader.skip_record()?;
                debug!("Skipped header row of {} columns", skipped);
                Ok(None)
            }
        }
    }

    fn skip_blank_lines(&mut self) -> Result<()> {
        if self.dialect.ignore_empty_lines {
            self.reader.read_empty_lines()
        } else {
            self.reader.read_last_empty_line()
        }
    }

    /// Close the current row, checking that the element consumed all of it.
    fn finish_row(&mut self) -> Result<()> {
        if self.reader.record_no() == self.row && self.reader.at_empty_record()? {
            // The element took no columns; its row is a single empty one.
            self.reader.read_column()?;
        }
        if self.dialect.has_trailing_delimiter && self.reader.record_no() == self.row {
            self.reader.read_end_of_record()?;
        }
        if self.reader.record_no() == self.row && !self.reader.is_done() {
            if self.dialect.ignore_unknown_columns {
                let skipped = self.reader.skip_record()?;
                warn!("Ignoring {} extra columns in record {}", skipped, self.row);
            } else {
                return Err(CsvError::TrailingColumns {
                    record: self.row,
                    offset: self.reader.offset(),
                });
            }
        }
        Ok(())
    }

    // ===== Column access =====

    fn path(&self) -> String {
        render_path(&self.path)
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

    fn check_row(&self) -> Result<()> {
        if self.reader.is_done() {
            return Err(CsvError::UnexpectedEndOfInput {
                offset: self.reader.offset(),
            });
        }
        if self.reader.record_no() != self.row {
            return Err(CsvError::UnexpectedEndOfRecord {
                record: self.row,
                path: self.path(),
                offset: self.reader.offset(),
            });
        }
        Ok(())
    }

    /// Read the next column of the current row with its starting offset.
    fn column(&mut self) -> Result<(String, usize)> {
        self.check_row()?;
        let offset = self.reader.offset();
        let text = self.reader.read_column()?;
        Ok((text, offset))
    }

    fn peek_null(&mut self) -> Result<bool> {
        self.check_row()?;
        self.reader.is_null_token()
    }

    /// A null at the root or as a record-collection element is a row holding
    /// the null token alone; a leading null token may start a present value.
    fn peek_null_at(&mut self, position: Position) -> Result<bool> {
        if position == Position::Nested {
            return self.peek_null();
        }
        self.check_row()?;
        self.reader.is_null_row()
    }

    fn read_null(&mut self) -> Result<Value> {
        self.column()?;
        Ok(Value::Null)
    }

    fn expect_null(&mut self) -> Result<()> {
        let (text, offset) = self.column()?;
        if text == self.dialect.null_string {
            Ok(())
        } else {
            Err(CsvError::NullMarkerMismatch {
                expected: self.dialect.null_string.clone(),
                actual: text,
                path: self.path(),
                offset,
            })
        }
    }

    fn malformed(&self, e: CsvParseError, offset: usize) -> CsvError {
        CsvError::MalformedPrimitive {
            value: e.value,
            expected: e.expected_type,
            path: self.path(),
            offset,
        }
    }

    fn read_presence(&mut self) -> Result<bool> {
        let (text, offset) = self.column()?;
        let flag = parse_primitive(&text, PrimitiveKind::Bool).map_err(|e| self.malformed(e, offset))?;
        Ok(matches!(flag, Value::Bool(true)))
    }

    fn read_length(&mut self) -> Result<usize> {
        let (text, offset) = self.column()?;
        match text.parse::<usize>() {
            Ok(len) => Ok(len),
            Err(_) => Err(CsvError::MalformedPrimitive {
                value: text,
                expected: "collection length".to_string(),
                path: self.path(),
                offset,
            }),
        }
    }

    fn read_tag(&mut self, union: &UnionSchema, schema: &Schema) -> Result<(usize, String)> {
        let (text, offset) = self.column()?;
        match union.variant_index(&text) {
            Some(index) => Ok((index, text)),
            None => Err(CsvError::UnknownVariant {
                value: text,
                schema: schema.describe(),
                path: self.path(),
                offset,
            }),
        }
    }

    // ===== Values =====

    fn decode_value(
        &mut self,
        schema: &Schema,
        headers: Option<&HeaderTable>,
        position: Position,
    ) -> Result<Value> {
        if let Some(codec) = deferred_codec(self.dialect, schema) {
            if schema.nullable && self.peek_null()? {
                return self.read_null();
            }
            let (text, _) = self.column()?;
            return codec
                .decode_from_string(schema, &text)
                .map_err(|source| CsvError::Deferred {
                    path: self.path(),
                    source,
                });
        }

        match &schema.kind {
            SchemaKind::Record(record) => {
                if schema.nullable {
                    if position == Position::Nested {
                        if !self.read_presence()? {
                            self.skip_fields(record)?;
                            return Ok(Value::Null);
                        }
                    } else if self.peek_null_at(position)? {
                        return self.read_null();
                    }
                }
                self.decode_record(record, headers)
            }
            SchemaKind::Sealed(union) => {
                if schema.nullable && self.peek_null()? {
                    self.skip_nulls(schema)?;
                    return Ok(Value::Null);
                }
                self.decode_sealed(union, schema)
            }
            SchemaKind::Singleton(_) => Ok(Value::Singleton),
            _ if schema.nullable && self.peek_null_at(position)? => self.read_null(),
            SchemaKind::Primitive(kind) => {
                let (text, offset) = self.column()?;
                parse_primitive(&text, *kind).map_err(|e| self.malformed(e, offset))
            }
            SchemaKind::Enum(enumeration) => {
                let (text, offset) = self.column()?;
                if enumeration.contains(&text) {
                    Ok(Value::Enum(text))
                } else {
                    Err(CsvError::UnknownVariant {
                        value: text,
                        schema: schema.describe(),
                        path: self.path(),
                        offset,
                    })
                }
            }
            SchemaKind::List(element) => {
                let item = |d: &mut Self, i: usize| {
                    d.with_path(format!("[{i}]"), |d| {
                        d.decode_value(element, None, Position::Nested)
                    })
                };
                let items = if position == Position::Row {
                    self.decode_row(item)?
                } else {
                    let len = self.read_length()?;
                    (0..len).map(|i| item(self, i)).collect::<Result<Vec<_>>>()?
                };
                Ok(Value::List(items))
            }
            SchemaKind::Map { key, value } => {
                let entry = |d: &mut Self, i: usize| {
                    d.with_path(format!("[{i}]"), |d| {
                        let k = d.decode_value(key, None, Position::Nested)?;
                        let v = d.decode_value(value, None, Position::Nested)?;
                        Ok((k, v))
                    })
                };
                let entries = if position == Position::Row {
                    self.decode_row(entry)?
                } else {
                    let len = self.read_length()?;
                    (0..len).map(|i| entry(self, i)).collect::<Result<Vec<_>>>()?
                };
                Ok(Value::Map(entries))
            }
            SchemaKind::Open(union) => {
                let (index, tag) = self.read_tag(union, schema)?;
                let variant = &union.variants[index];
                let value = self.with_path(&variant.tag, |d| {
                    d.decode_value(&variant.schema, None, Position::Nested)
                })?;
                Ok(Value::Variant {
                    tag,
                    value: Box::new(value),
                })
            }
        }
    }

    /// Items of a collection spread over the rest of the row.
    fn decode_row<T>(
        &mut self,
        mut item: impl FnMut(&mut Self, usize) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        if self.reader.at_empty_record()? {
            return Ok(items);
        }
        while self.reader.record_no() == self.row && !self.reader.is_done() {
            if self.dialect.has_trailing_delimiter
                && self.reader.column_no() > 0
                && self.reader.at_end_of_line()?
            {
                break;
            }
            let index = items.len();
            items.push(item(self, index)?);
        }
        Ok(items)
    }

    fn decode_record(&mut self, record: &RecordSchema, headers: Option<&HeaderTable>) -> Result<Value> {
        let Some(table) = headers else {
            let fields = record
                .fields
                .iter()
                .map(|field| {
                    self.with_path(&field.name, |d| {
                        d.decode_value(&field.schema, None, Position::Nested)
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Value::Record(fields));
        };

        let mut slots: Vec<Option<Value>> = vec![None; record.fields.len()];
        for entry in table.entries() {
            match entry {
                HeaderEntry::Unknown => {
                    self.column()?;
                }
                HeaderEntry::Field { index } => {
                    let field = &record.fields[*index];
                    let value = self.with_path(&field.name, |d| {
                        d.decode_value(&field.schema, None, Position::Nested)
                    })?;
                    slots[*index] = Some(value);
                }
                HeaderEntry::Nested {
                    index,
                    presence,
                    headers,
                } => {
                    let field = &record.fields[*index];
                    let nested = nested_record(&field.schema, &field.name)?;
                    let value = self.with_path(&field.name, |d| {
                        if *presence && !d.read_presence()? {
                            d.skip_table_nulls(nested, headers)?;
                            return Ok(Value::Null);
                        }
                        d.decode_record(nested, Some(headers))
                    })?;
                    slots[*index] = Some(value);
                }
            }
        }

        let fields = record
            .fields
            .iter()
            .zip(slots)
            .map(|(field, slot)| match slot {
                Some(value) => Ok(value),
                None if matches!(field.schema.kind, SchemaKind::Singleton(_)) => Ok(Value::Singleton),
                None if field.schema.nullable => Ok(Value::Null),
                None => Err(CsvError::MissingField {
                    record: record.name.clone(),
                    field: field.name.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Record(fields))
    }

    fn decode_sealed(&mut self, union: &UnionSchema, schema: &Schema) -> Result<Value> {
        let (active, tag) = self.read_tag(union, schema)?;
        let mut value = Value::Null;
        for (index, variant) in union.variants.iter().enumerate() {
            self.with_path(&variant.tag, |d| {
                if index == active {
                    value = d.decode_value(&variant.schema, None, Position::Nested)?;
                    Ok(())
                } else {
                    d.skip_nulls(&variant.schema)
                }
            })?;
        }
        Ok(Value::Variant {
            tag,
            value: Box::new(value),
        })
    }

    // ===== Null fill =====

    /// Consume the null columns an absent node leaves behind.
    fn skip_nulls(&mut self, schema: &Schema) -> Result<()> {
        if deferred_codec(self.dialect, schema).is_some() {
            return self.expect_null();
        }
        match &schema.kind {
            SchemaKind::Singleton(_) => Ok(()),
            SchemaKind::Record(record) => {
                if schema.nullable {
                    self.expect_null()?;
                }
                self.skip_fields(record)
            }
            SchemaKind::Sealed(union) => {
                self.expect_null()?;
                for variant in &union.variants {
                    self.with_path(&variant.tag, |d| d.skip_nulls(&variant.schema))?;
                }
                Ok(())
            }
            _ => self.expect_null(),
        }
    }

    fn skip_fields(&mut self, record: &RecordSchema) -> Result<()> {
        for field in &record.fields {
            self.with_path(&field.name, |d| d.skip_nulls(&field.schema))?;
        }
        Ok(())
    }

    fn skip_table_nulls(&mut self, record: &RecordSchema, table: &HeaderTable) -> Result<()> {
        for entry in table.entries() {
            match entry {
                HeaderEntry::Unknown => {
                    self.column()?;
                }
                HeaderEntry::Field { index } => {
                    let field = &record.fields[*index];
                    self.with_path(&field.name, |d| d.skip_nulls(&field.schema))?;
                }
                HeaderEntry::Nested {
                    index,
                    presence,
                    headers,
                } => {
                    let field = &record.fields[*index];
                    let nested = nested_record(&field.schema, &field.name)?;
                    self.with_path(&field.name, |d| {
                        if *presence {
                            d.expect_null()?;
                        }
                        d.skip_table_nulls(nested, headers)
                    })?;
                }
            }
        }
        Ok(())
    }
}

fn nested_record<'s>(schema: &'s Schema, name: &str) -> Result<&'s RecordSchema> {
    schema
        .as_record()
        .ok_or_else(|| CsvError::UnsupportedSchemaKind {
            kind: schema.kind_name().to_string(),
            path: name.to_string(),
            reason: "nested header columns require a record".to_string(),
        })
}
