//! Printer: writes columns and records to a character sink.
//!
//! Records are separated, not terminated: the record separator is written
//! when the next record begins, so output never ends with a separator.

use crate::dialect::{Dialect, QuoteMode, ESCAPE_SEQUENCES};
use crate::error::Result;
use std::fmt::Write;

pub struct CsvWriter<'d, W> {
    sink: W,
    dialect: &'d Dialect,
    first_record: bool,
    first_column: bool,
}

impl<'d, W: Write> CsvWriter<'d, W> {
    pub fn new(sink: W, dialect: &'d Dialect) -> Self {
        Self {
            sink,
            dialect,
            first_record: true,
            first_column: true,
        }
    }

    /// True until the first record has been ended.
    pub fn is_first_record(&self) -> bool {
        self.first_record
    }

    pub fn begin_record(&mut self) -> Result<()> {
        if !self.first_record {
            self.sink.write_str(&self.dialect.record_separator)?;
        }
        self.first_column = true;
        Ok(())
    }

    pub fn end_record(&mut self) -> Result<()> {
        if self.dialect.has_trailing_delimiter {
            self.sink.write_char(self.dialect.delimiter)?;
        }
        self.first_record = false;
        Ok(())
    }

    /// Write one column, quoting or escaping it as the dialect requires.
    pub fn print_column(&mut self, value: &str, is_numeric: bool, is_null: bool) -> Result<()> {
        if !self.first_column {
            self.sink.write_char(self.dialect.delimiter)?;
        }
        self.first_column = false;

        let quote = match self.dialect.effective_quote_mode() {
            QuoteMode::Never => {
                return self.print_escaped(value);
            }
            QuoteMode::NonNumericOnly => !is_numeric || self.requires_quotes(value),
            QuoteMode::AllExceptNull => !is_null || self.requires_quotes(value),
            QuoteMode::RequiredOnly => self.requires_quotes(value),
            QuoteMode::All => true,
        };

        match self.dialect.quote_char {
            Some(q) if quote => {
                self.sink.write_char(q)?;
                for c in value.chars() {
                    if c == q {
                        self.sink.write_char(q)?;
                    }
                    self.sink.write_char(c)?;
                }
                self.sink.write_char(q)?;
            }
            _ => self.sink.write_str(value)?,
        }
        Ok(())
    }

    fn requires_quotes(&self, value: &str) -> bool {
        let d = self.dialect;
        if d.trim_unquoted_whitespace
            && (value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace))
        {
            return true;
        }
        value.contains(&d.record_separator)
            || value.chars().any(|c| {
                c == d.delimiter || Some(c) == d.quote_char || Some(c) == d.escape_char
            })
    }

    fn print_escaped(&mut self, value: &str) -> Result<()> {
        let d = self.dialect;
        // Validation guarantees an escape char whenever quoting is off.
        let Some(escape) = d.escape_char else {
            self.sink.write_str(value)?;
            return Ok(());
        };

        let chars: Vec<char> = value.chars().collect();
        let last = chars.len().saturating_sub(1);
        for (i, &c) in chars.iter().enumerate() {
            let edge_whitespace =
                d.trim_unquoted_whitespace && c.is_whitespace() && (i == 0 || i == last);
            if let Some((letter, _)) = ESCAPE_SEQUENCES.iter().find(|(_, control)| *control == c) {
                self.sink.write_char(escape)?;
                self.sink.write_char(*letter)?;
            } else if c == d.delimiter
                || c == escape
                || Some(c) == d.quote_char
                || d.record_separator.contains(c)
                || edge_whitespace
            {
                self.sink.write_char(escape)?;
                self.sink.write_char(c)?;
            } else {
                self.sink.write_char(c)?;
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
