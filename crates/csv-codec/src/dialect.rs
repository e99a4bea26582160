//! CSV dialect configuration.
//!
//! A [`Dialect`] is the immutable bundle of formatting options shared by the
//! reader, the writer and the structural walkers. It deserializes from any
//! serde format with every member optional:
//!
//! ```toml
//! delimiter = ";"
//! quote_mode = "all"
//! null_string = "NULL"
//! has_header_record = true
//! ```

use crate::deferred::SubCodec;
use crate::error::{CsvError, Result};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// When the writer wraps a column in quote characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteMode {
    /// Never quote; escape special characters with the escape char instead.
    Never,
    /// Quote everything that is not a number.
    NonNumericOnly,
    /// Quote everything except null tokens.
    AllExceptNull,
    /// Quote only when the text would otherwise be misread.
    #[default]
    RequiredOnly,
    All,
}

/// Escape-sequence letters; the escape char followed by one of these is a
/// control character rather than the letter itself.
pub(crate) const ESCAPE_SEQUENCES: [(char, char); 3] = [('n', '\n'), ('t', '\t'), ('r', '\r')];

/// Formatting options for reading and writing CSV.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Dialect {
    pub delimiter: char,
    /// `None` disables quoting altogether.
    pub quote_char: Option<char>,
    pub escape_char: Option<char>,
    pub quote_mode: QuoteMode,
    pub record_separator: String,
    /// Text standing for a null value.
    pub null_string: String,
    /// Joins nested field names in header columns.
    pub header_separator: String,
    pub has_header_record: bool,
    pub has_trailing_delimiter: bool,
    pub ignore_empty_lines: bool,
    pub ignore_unknown_columns: bool,
    pub trim_unquoted_whitespace: bool,
    /// Codec for variable-width subtrees, written as a single column.
    #[serde(skip)]
    pub deferred: Option<Arc<dyn SubCodec>>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote_char: Some('"'),
            escape_char: None,
            quote_mode: QuoteMode::RequiredOnly,
            record_separator: "\n".to_string(),
            null_string: String::new(),
            header_separator: ".".to_string(),
            has_header_record: false,
            has_trailing_delimiter: false,
            ignore_empty_lines: true,
            ignore_unknown_columns: false,
            trim_unquoted_whitespace: false,
            deferred: None,
        }
    }
}

impl fmt::Debug for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("delimiter", &self.delimiter)
            .field("quote_char", &self.quote_char)
            .field("escape_char", &self.escape_char)
            .field("quote_mode", &self.quote_mode)
            .field("record_separator", &self.record_separator)
            .field("null_string", &self.null_string)
            .field("header_separator", &self.header_separator)
            .field("has_header_record", &self.has_header_record)
            .field("has_trailing_delimiter", &self.has_trailing_delimiter)
            .field("ignore_empty_lines", &self.ignore_empty_lines)
            .field("ignore_unknown_columns", &self.ignore_unknown_columns)
            .field("trim_unquoted_whitespace", &self.trim_unquoted_whitespace)
            .field("deferred", &self.deferred.is_some())
            .finish()
    }
}

impl Dialect {
    /// Builder-style setter for the deferred sub-codec.
    pub fn with_deferred(mut self, codec: Arc<dyn SubCodec>) -> Self {
        self.deferred = Some(codec);
        self
    }

    /// The quote policy actually in effect; without a quote char nothing
    /// can be quoted.
    pub fn effective_quote_mode(&self) -> QuoteMode {
        if self.quote_char.is_none() {
            QuoteMode::Never
        } else {
            self.quote_mode
        }
    }

    /// Reject option combinations the tokenizer cannot read back.
    pub fn validate(&self) -> Result<()> {
        let ambiguous = |reason: String| Err(CsvError::AmbiguousDialect(reason));

        if self.record_separator.is_empty() {
            return ambiguous("record separator must not be empty".to_string());
        }
        if self.header_separator.is_empty() {
            return ambiguous("header separator must not be empty".to_string());
        }

        let mut specials = vec![("delimiter", self.delimiter)];
        if let Some(quote) = self.quote_char {
            specials.push(("quote char", quote));
        }
        if let Some(escape) = self.escape_char {
            specials.push(("escape char", escape));
        }

        for (i, (name, c)) in specials.iter().enumerate() {
            for (other_name, other) in &specials[i + 1..] {
                if c == other {
                    return ambiguous(format!("{name} and {other_name} are both {c:?}"));
                }
            }
            if self.record_separator.contains(*c) {
                return ambiguous(format!(
                    "{name} {c:?} occurs in record separator {:?}",
                    self.record_separator
                ));
            }
        }

        if self.effective_quote_mode() == QuoteMode::Never && self.escape_char.is_none() {
            return ambiguous("unquoted output requires an escape char".to_string());
        }

        if self.escape_char.is_some() {
            let letters: Vec<char> = ESCAPE_SEQUENCES.iter().map(|(letter, _)| *letter).collect();
            let clashes = specials
                .iter()
                .filter(|(name, _)| *name != "escape char")
                .map(|(_, c)| *c)
                .chain(self.record_separator.chars())
                .find(|c| letters.contains(c));
            if let Some(c) = clashes {
                return ambiguous(format!("{c:?} is also an escape sequence letter"));
            }
        }

        Ok(())
    }
}
