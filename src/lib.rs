//! schema-csv library
//!
//! Converts between CSV and JSON under a YAML schema document, using the
//! `csv-codec` engine for the CSV side and `json-types` for the JSON side.
//!
//! # CLI Usage
//!
//! ```bash
//! # CSV with a header row to pretty JSON
//! schema-csv decode --schema people.yaml --input people.csv --header --pretty
//!
//! # JSON back to semicolon-separated CSV
//! schema-csv encode --schema people.yaml --input people.json --delimiter ';'
//!
//! # Print the header row a schema is written with
//! schema-csv header --schema people.yaml --header-separator _
//! ```

use anyhow::Context;
use clap::{Args, ValueEnum};
use csv_codec::{Csv, Dialect, JsonSubCodec, QuoteMode};
use schema_core::{Schema, SchemaDocument};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub mod config;

use config::dialect::{load_dialect, unescape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum QuoteModeArg {
    /// Never quote; escape special characters instead
    #[value(name = "never")]
    Never,
    /// Quote every column that is not a number
    #[value(name = "non-numeric")]
    NonNumeric,
    /// Quote every column except null tokens
    #[value(name = "all-except-null")]
    AllExceptNull,
    /// Quote only columns that would otherwise be misread
    #[value(name = "required")]
    Required,
    /// Quote every column
    #[value(name = "all")]
    All,
}

impl From<QuoteModeArg> for QuoteMode {
    fn from(arg: QuoteModeArg) -> Self {
        match arg {
            QuoteModeArg::Never => QuoteMode::Never,
            QuoteModeArg::NonNumeric => QuoteMode::NonNumericOnly,
            QuoteModeArg::AllExceptNull => QuoteMode::AllExceptNull,
            QuoteModeArg::Required => QuoteMode::RequiredOnly,
            QuoteModeArg::All => QuoteMode::All,
        }
    }
}

/// CSV dialect options. Flags override the dialect file, which overrides
/// the defaults.
#[derive(Args, Clone, Debug, Default)]
pub struct DialectOpts {
    /// TOML file with dialect settings
    #[arg(long = "dialect", value_name = "PATH", env = "SCHEMA_CSV_DIALECT")]
    pub dialect_file: Option<PathBuf>,

    /// Column delimiter
    #[arg(long, env = "SCHEMA_CSV_DELIMITER")]
    pub delimiter: Option<char>,

    /// Quote character
    #[arg(long, env = "SCHEMA_CSV_QUOTE_CHAR")]
    pub quote_char: Option<char>,

    /// Disable quoting altogether (requires --escape-char)
    #[arg(long, conflicts_with = "quote_char")]
    pub no_quote: bool,

    /// Escape character
    #[arg(long, env = "SCHEMA_CSV_ESCAPE_CHAR")]
    pub escape_char: Option<char>,

    /// When columns are quoted on output
    #[arg(long, value_enum, env = "SCHEMA_CSV_QUOTE_MODE")]
    pub quote_mode: Option<QuoteModeArg>,

    /// Record separator; `\n`, `\r` and `\t` are expanded
    #[arg(long, env = "SCHEMA_CSV_RECORD_SEPARATOR")]
    pub record_separator: Option<String>,

    /// Text standing for null
    #[arg(long, env = "SCHEMA_CSV_NULL_STRING")]
    pub null_string: Option<String>,

    /// Joins nested field names in the header row
    #[arg(long, env = "SCHEMA_CSV_HEADER_SEPARATOR")]
    pub header_separator: Option<String>,

    /// Read and write a header row
    #[arg(long)]
    pub header: bool,

    /// Every record ends with a delimiter
    #[arg(long)]
    pub trailing_delimiter: bool,

    /// Treat blank lines as records instead of skipping them
    #[arg(long)]
    pub keep_empty_lines: bool,

    /// Skip header columns and trailing row columns the schema does not know
    #[arg(long)]
    pub ignore_unknown_columns: bool,

    /// Trim whitespace around unquoted columns
    #[arg(long)]
    pub trim_whitespace: bool,

    /// Write lists, maps and open unions as one JSON column
    #[arg(long)]
    pub defer_json: bool,
}

impl DialectOpts {
    /// Resolve the effective dialect.
    pub fn to_dialect(&self) -> anyhow::Result<Dialect> {
        let mut dialect = match &self.dialect_file {
            Some(path) => load_dialect(path)?,
            None => Dialect::default(),
        };

        if let Some(delimiter) = self.delimiter {
            dialect.delimiter = delimiter;
        }
        if self.no_quote {
            dialect.quote_char = None;
        } else if let Some(quote) = self.quote_char {
            dialect.quote_char = Some(quote);
        }
        if let Some(escape) = self.escape_char {
            dialect.escape_char = Some(escape);
        }
        if let Some(mode) = self.quote_mode {
            dialect.quote_mode = mode.into();
        }
        if let Some(separator) = &self.record_separator {
            dialect.record_separator = unescape(separator);
        }
        if let Some(null) = &self.null_string {
            dialect.null_string = null.clone();
        }
        if let Some(separator) = &self.header_separator {
            dialect.header_separator = separator.clone();
        }
        dialect.has_header_record |= self.header;
        dialect.has_trailing_delimiter |= self.trailing_delimiter;
        dialect.ignore_empty_lines &= !self.keep_empty_lines;
        dialect.ignore_unknown_columns |= self.ignore_unknown_columns;
        dialect.trim_unquoted_whitespace |= self.trim_whitespace;
        if self.defer_json {
            dialect = dialect.with_deferred(Arc::new(JsonSubCodec));
        }

        debug!("Resolved dialect: {:?}", dialect);
        Ok(dialect)
    }

    /// Resolve the dialect and build a codec from it.
    pub fn to_codec(&self) -> anyhow::Result<Csv> {
        let dialect = self.to_dialect()?;
        Csv::new(dialect).context("Invalid CSV dialect")
    }
}

/// Load the root schema of a YAML schema document.
pub fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let document = SchemaDocument::from_file(path)
        .with_context(|| format!("Failed to load schema from {path:?}"))?;
    Ok(document.root)
}

/// Decode CSV from `input` into schema-shaped JSON.
pub fn csv_to_json<R: BufRead>(
    csv: &Csv,
    schema: &Schema,
    input: R,
) -> anyhow::Result<serde_json::Value> {
    let value = csv
        .decode_from_reader(schema, input)
        .context("Failed to decode CSV")?;
    let json = json_types::value_to_json(schema, &value).context("Failed to convert to JSON")?;
    Ok(json)
}

/// Encode schema-shaped JSON as CSV into `output`.
pub fn json_to_csv<W: Write>(
    csv: &Csv,
    schema: &Schema,
    json: &serde_json::Value,
    output: W,
) -> anyhow::Result<()> {
    let value = json_types::json_to_value(schema, json).context("Failed to read JSON input")?;
    csv.encode_to_writer(schema, &value, output)
        .context("Failed to encode CSV")?;
    Ok(())
}
