//! Schema-driven CSV encoding and decoding.
//!
//! A [`Schema`] decides how a [`Value`] is laid out as columns and records:
//! a root list becomes one record per element, records flatten into
//! consecutive columns, nullable nested records carry a presence column,
//! sealed unions reserve columns for every variant, and lists or maps
//! nested inline are prefixed by their length. Lists, maps and open unions
//! can instead be embedded as a single column through a [`SubCodec`].
//!
//! # Modules
//!
//! - [`source`] - character sources with nested mark/reset
//! - [`reader`] - tokenizer producing columns and records
//! - [`writer`] - printer applying quoting and escaping
//! - [`headers`] - header row naming and resolution
//! - [`forward`] - primitive Value → column text
//! - [`reverse`] - column text → primitive Value
//! - [`deferred`] - single-column sub-codecs
//!
//! # Example
//!
//! ```
//! use csv_codec::{Csv, Dialect};
//! use schema_core::{Field, Schema, Value};
//!
//! let schema = Schema::list(Schema::record(
//!     "Point",
//!     vec![Field::new("x", Schema::int()), Field::new("y", Schema::int())],
//! ));
//! let csv = Csv::new(Dialect {
//!     has_header_record: true,
//!     ..Dialect::default()
//! })
//! .unwrap();
//!
//! let value = Value::list(vec![
//!     Value::record(vec![Value::Int(1), Value::Int(2)]),
//!     Value::record(vec![Value::Int(3), Value::Int(4)]),
//! ]);
//! let text = csv.encode_to_string(&schema, &value).unwrap();
//! assert_eq!(text, "x,y\n1,2\n3,4");
//! assert_eq!(csv.decode_from_str(&schema, &text).unwrap(), value);
//! ```

mod decode;
pub mod deferred;
pub mod dialect;
mod encode;
pub mod error;
pub mod forward;
pub mod headers;
pub mod reader;
pub mod reverse;
pub mod source;
pub mod writer;

pub use deferred::{JsonSubCodec, SubCodec, SubCodecError};
pub use dialect::{Dialect, QuoteMode};
pub use error::{CsvError, Result};
pub use forward::CsvValue;
pub use reverse::CsvParseError;
pub use source::{FetchSource, Source, StringSource};

use decode::Decoder;
use encode::Encoder;
use schema_core::{Schema, SchemaKind, Value};
use std::io::{self, BufRead};
use tracing::debug;

/// Where a node sits relative to records; decides how a null record and a
/// list are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// The whole input is this one value.
    Root,
    /// An element of a root list, owning one record.
    Row,
    /// Inside a record, union or inline collection.
    Nested,
}

/// Render a field path for error messages, `$` for the root.
pub(crate) fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        return "$".to_string();
    }
    let mut rendered = String::new();
    for segment in path {
        if !rendered.is_empty() && !segment.starts_with('[') {
            rendered.push('.');
        }
        rendered.push_str(segment);
    }
    rendered
}

/// CSV codec bound to a validated dialect.
#[derive(Debug, Clone, Default)]
pub struct Csv {
    dialect: Dialect,
}

impl Csv {
    /// Create a codec, rejecting ambiguous dialects up front.
    pub fn new(dialect: Dialect) -> Result<Self> {
        dialect.validate()?;
        debug!("Created CSV codec with {:?}", dialect);
        Ok(Self { dialect })
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn encode_to_string(&self, schema: &Schema, value: &Value) -> Result<String> {
        Encoder::new(String::new(), &self.dialect).encode(schema, value)
    }

    /// Encode into a byte sink as UTF-8.
    pub fn encode_to_writer<W: io::Write>(&self, schema: &Schema, value: &Value, writer: W) -> Result<()> {
        let mut sink = IoSink::new(writer);
        let result = Encoder::new(&mut sink, &self.dialect)
            .encode(schema, value)
            .map(drop);
        sink.finish(result)
    }

    pub fn decode_from_str(&self, schema: &Schema, input: &str) -> Result<Value> {
        self.decode_from_source(schema, StringSource::new(input))
    }

    /// Decode from a buffered reader, fetching input line by line.
    pub fn decode_from_reader<R: BufRead>(&self, schema: &Schema, reader: R) -> Result<Value> {
        self.decode_from_source(schema, FetchSource::new(reader))
    }

    pub fn decode_from_source<S: Source>(&self, schema: &Schema, source: S) -> Result<Value> {
        Decoder::new(source, &self.dialect).decode(schema)
    }

    /// The header row `schema` would be written with, without a trailing
    /// record separator.
    pub fn header_record(&self, schema: &Schema) -> Result<String> {
        let target = match &schema.kind {
            SchemaKind::List(element) => element.as_ref(),
            _ => schema,
        };
        let names = headers::root_header_names(target, &self.dialect)?;
        let mut writer = writer::CsvWriter::new(String::new(), &self.dialect);
        writer.begin_record()?;
        for name in &names {
            writer.print_column(name, false, false)?;
        }
        writer.end_record()?;
        Ok(writer.into_inner())
    }
}

/// Adapts an `io::Write` to the character sink the writer prints into,
/// keeping the I/O error that `fmt::Write` cannot carry.
struct IoSink<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: io::Write> IoSink<W> {
    fn new(inner: W) -> Self {
        Self { inner, error: None }
    }

    /// Prefer the underlying I/O error over the bare formatting error it
    /// surfaced as.
    fn finish(mut self, result: Result<()>) -> Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e.into());
        }
        result?;
        self.inner.flush()?;
        Ok(())
    }
}

impl<W: io::Write> std::fmt::Write for IoSink<W> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            std::fmt::Error
        })
    }
}
