//! Tokenizer: turns a character source into columns and records.
//!
//! [`CsvReader::read_column`] returns one logical column and then consumes
//! the boundary that follows it: a delimiter keeps the record open, a
//! record separator closes it and bumps the record number, end-of-input
//! marks the reader done.
//!
//! Marks are taken on the reader rather than on the source so the record
//! and column counters rewind together with the position.

use crate::dialect::{Dialect, ESCAPE_SEQUENCES};
use crate::error::{CsvError, Result};
use crate::source::Source;

#[derive(Debug, Clone, Copy)]
struct Counters {
    record_no: usize,
    column_no: usize,
}

pub struct CsvReader<'d, S> {
    source: S,
    dialect: &'d Dialect,
    separator: Vec<char>,
    counters: Counters,
    marks: Vec<Counters>,
}

impl<'d, S: Source> CsvReader<'d, S> {
    pub fn new(source: S, dialect: &'d Dialect) -> Self {
        Self {
            source,
            dialect,
            separator: dialect.record_separator.chars().collect(),
            counters: Counters {
                record_no: 0,
                column_no: 0,
            },
            marks: Vec::new(),
        }
    }

    /// True once end-of-input has been consumed.
    pub fn is_done(&self) -> bool {
        !self.source.can_read()
    }

    /// Number of records closed so far.
    pub fn record_no(&self) -> usize {
        self.counters.record_no
    }

    pub fn is_first_record(&self) -> bool {
        self.counters.record_no == 0
    }

    /// Columns read from the current record so far.
    pub fn column_no(&self) -> usize {
        self.counters.column_no
    }

    pub fn offset(&self) -> usize {
        self.source.offset()
    }

    pub fn mark(&mut self) {
        self.marks.push(self.counters);
        self.source.mark();
    }

    pub fn unmark(&mut self) {
        self.marks.pop();
        self.source.unmark();
    }

    pub fn reset(&mut self) {
        if let Some(counters) = self.marks.pop() {
            self.counters = counters;
        }
        self.source.reset();
    }

    /// Whether the next characters are the record separator.
    fn at_separator(&mut self) -> Result<bool> {
        let first = match self.source.peek()? {
            Some(c) => c,
            None => return Ok(false),
        };
        if first != self.separator[0] {
            return Ok(false);
        }
        if self.separator.len() == 1 {
            return Ok(true);
        }
        self.source.mark();
        let mut matched = true;
        for &expected in &self.separator {
            if self.source.read()? != Some(expected) {
                matched = false;
                break;
            }
        }
        self.source.reset();
        Ok(matched)
    }

    fn consume_separator(&mut self) -> Result<()> {
        for _ in 0..self.separator.len() {
            self.source.read()?;
        }
        Ok(())
    }

    /// Whether the current record has no more characters before its end.
    pub fn at_end_of_line(&mut self) -> Result<bool> {
        Ok(self.source.peek()?.is_none() || self.at_separator()?)
    }

    /// Whether nothing is left of the current record but its end, or only
    /// the trailing delimiter when the dialect writes one.
    pub fn at_empty_record(&mut self) -> Result<bool> {
        if self.counters.column_no != 0 {
            return Ok(false);
        }
        if self.at_end_of_line()? {
            return Ok(true);
        }
        if !self.dialect.has_trailing_delimiter
            || self.source.peek()? != Some(self.dialect.delimiter)
        {
            return Ok(false);
        }
        self.source.mark();
        self.source.read()?;
        let empty = self.at_end_of_line()?;
        self.source.reset();
        Ok(empty)
    }

    /// Read one column and the boundary after it.
    pub fn read_column(&mut self) -> Result<String> {
        if self.is_done() {
            return Err(CsvError::UnexpectedEndOfInput {
                offset: self.offset(),
            });
        }

        let value = self.read_value()?;

        if self.source.peek()? == Some(self.dialect.delimiter) {
            self.source.read()?;
            self.counters.column_no += 1;
        } else if self.at_separator()? {
            self.consume_separator()?;
            self.end_record();
        } else if self.source.peek()?.is_none() {
            self.source.read()?;
            self.end_record();
        }

        Ok(value)
    }

    fn end_record(&mut self) {
        self.counters.record_no += 1;
        self.counters.column_no = 0;
    }

    fn read_value(&mut self) -> Result<String> {
        let trim = self.dialect.trim_unquoted_whitespace;
        let mut value = String::new();
        // Length of `value` (in chars) that trimming must not cut into.
        let mut protected = 0;
        let mut len = 0;

        if trim {
            while let Some(c) = self.source.peek()? {
                if c.is_whitespace() && c != self.dialect.delimiter && !self.at_separator()? {
                    self.source.read()?;
                } else {
                    break;
                }
            }
        }

        if self.dialect.quote_char.is_some() && self.source.peek()? == self.dialect.quote_char {
            self.read_quoted(&mut value)?;
            len = value.chars().count();
            protected = len;
        }

        loop {
            let c = match self.source.peek()? {
                None => break,
                Some(c) => c,
            };
            if c == self.dialect.delimiter || self.at_separator()? {
                break;
            }
            self.source.read()?;
            if Some(c) == self.dialect.escape_char {
                let escaped = self
                    .source
                    .read()?
                    .ok_or_else(|| CsvError::UnexpectedEndOfInput {
                        offset: self.offset(),
                    })?;
                let literal = ESCAPE_SEQUENCES
                    .iter()
                    .find(|(letter, _)| *letter == escaped)
                    .map(|(_, control)| *control)
                    .unwrap_or(escaped);
                value.push(literal);
                len += 1;
                protected = len;
            } else {
                value.push(c);
                len += 1;
            }
        }

        if trim {
            while len > protected && value.ends_with(char::is_whitespace) {
                value.pop();
                len -= 1;
            }
        }

        Ok(value)
    }

    /// Read a quoted section, leaving the source after the closing quote.
    fn read_quoted(&mut self, value: &mut String) -> Result<()> {
        let quote = self.dialect.quote_char;
        self.source.read()?;
        loop {
            match self.source.read()? {
                None => {
                    return Err(CsvError::UnexpectedEndOfInput {
                        offset: self.offset(),
                    })
                }
                Some(c) if Some(c) == quote => {
                    if self.source.peek()? == quote {
                        self.source.read()?;
                        value.push(c);
                    } else {
                        return Ok(());
                    }
                }
                Some(c) => value.push(c),
            }
        }
    }

    /// Consume a record separator, or end-of-input, if one is next.
    pub fn read_end_of_record(&mut self) -> Result<()> {
        if self.source.peek()?.is_none() {
            self.source.read()?;
            self.end_record();
        } else if self.at_separator()? {
            self.consume_separator()?;
            self.end_record();
        }
        Ok(())
    }

    /// Skip blank records; at end-of-input, consume it.
    pub fn read_empty_lines(&mut self) -> Result<()> {
        while self.at_separator()? {
            self.consume_separator()?;
        }
        if self.source.peek()?.is_none() && !self.is_done() {
            self.source.read()?;
        }
        Ok(())
    }

    /// Consume a final blank line if it is the last thing in the input.
    pub fn read_last_empty_line(&mut self) -> Result<()> {
        self.mark();
        self.read_end_of_record()?;
        if self.is_done() {
            self.unmark();
        } else {
            self.reset();
        }
        Ok(())
    }

    /// Discard the rest of the current record.
    pub fn skip_record(&mut self) -> Result<usize> {
        let start = self.record_no();
        let mut skipped = 0;
        while !self.is_done() && self.record_no() == start {
            self.read_column()?;
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Whether the next column equals the null token, without consuming it.
    pub fn is_null_token(&mut self) -> Result<bool> {
        self.mark();
        let value = match self.read_column() {
            Ok(value) => value,
            Err(e) => {
                self.reset();
                return Err(e);
            }
        };
        self.reset();
        Ok(value == self.dialect.null_string)
    }

    /// Whether the rest of the current record is the null token alone,
    /// without consuming it.
    pub fn is_null_row(&mut self) -> Result<bool> {
        let record = self.record_no();
        self.mark();
        let result = self.read_column().and_then(|value| {
            if value != self.dialect.null_string {
                return Ok(false);
            }
            if self.record_no() != record {
                return Ok(true);
            }
            Ok(self.dialect.has_trailing_delimiter && self.at_end_of_line()?)
        });
        self.reset();
        result
    }
}
