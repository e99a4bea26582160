//! Character sources with nested mark/reset.
//!
//! A source yields one `char` at a time. End-of-input is reported as `None`,
//! and [`Source::can_read`] only turns false once a read has actually hit
//! it, so an empty input is "readable" until the first read.
//!
//! Marks form a stack: `mark` pushes the current position, `reset` pops
//! the most recent mark and rewinds to it, `unmark` pops it without rewinding.

use std::io::{self, BufRead};

/// Input the tokenizer reads from.
pub trait Source {
    /// False once a read has returned end-of-input.
    fn can_read(&self) -> bool;

    /// Consume the next character, `None` at end-of-input.
    fn read(&mut self) -> io::Result<Option<char>>;

    /// Look at the next character without consuming it.
    fn peek(&mut self) -> io::Result<Option<char>>;

    fn mark(&mut self);

    /// Drop the most recent mark and keep the current position.
    fn unmark(&mut self);

    /// Drop the most recent mark and rewind to it.
    fn reset(&mut self);

    /// Characters consumed so far.
    fn offset(&self) -> usize;
}

/// Source over an in-memory string.
#[derive(Debug, Clone)]
pub struct StringSource {
    chars: Vec<char>,
    // One past the end once end-of-input has been read.
    position: usize,
    marks: Vec<usize>,
}

impl StringSource {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            position: 0,
            marks: Vec::new(),
        }
    }
}

impl Source for StringSource {
    fn can_read(&self) -> bool {
        self.position <= self.chars.len()
    }

    fn read(&mut self) -> io::Result<Option<char>> {
        match self.chars.get(self.position) {
            Some(&c) => {
                self.position += 1;
                Ok(Some(c))
            }
            None => {
                self.position = self.chars.len() + 1;
                Ok(None)
            }
        }
    }

    fn peek(&mut self) -> io::Result<Option<char>> {
        Ok(self.chars.get(self.position).copied())
    }

    fn mark(&mut self) {
        self.marks.push(self.position);
    }

    fn unmark(&mut self) {
        self.marks.pop();
    }

    fn reset(&mut self) {
        if let Some(position) = self.marks.pop() {
            self.position = position;
        }
    }

    fn offset(&self) -> usize {
        self.position.min(self.chars.len())
    }
}

/// Source over a buffered reader, fetching one line at a time.
///
/// Text before the current position is discarded whenever no mark is
/// pending, so memory stays bounded by the longest marked span.
pub struct FetchSource<R> {
    reader: R,
    buffer: Vec<char>,
    // Absolute offset of `buffer[0]`.
    base: usize,
    position: usize,
    marks: Vec<usize>,
    exhausted: bool,
    past_end: bool,
}

impl<R: BufRead> FetchSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            base: 0,
            position: 0,
            marks: Vec::new(),
            exhausted: false,
            past_end: false,
        }
    }

    /// Make sure the character at `position` is buffered if the reader has one.
    fn fill(&mut self) -> io::Result<()> {
        while !self.exhausted && self.position - self.base >= self.buffer.len() {
            if self.marks.is_empty() {
                self.buffer.clear();
                self.base = self.position;
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                self.exhausted = true;
            } else {
                self.buffer.extend(line.chars());
            }
        }
        Ok(())
    }
}

impl<R: BufRead> Source for FetchSource<R> {
    fn can_read(&self) -> bool {
        !self.past_end
    }

    fn read(&mut self) -> io::Result<Option<char>> {
        self.fill()?;
        match self.buffer.get(self.position - self.base) {
            Some(&c) => {
                self.position += 1;
                Ok(Some(c))
            }
            None => {
                self.past_end = true;
                Ok(None)
            }
        }
    }

    fn peek(&mut self) -> io::Result<Option<char>> {
        self.fill()?;
        Ok(self.buffer.get(self.position - self.base).copied())
    }

    fn mark(&mut self) {
        self.marks.push(self.position);
    }

    fn unmark(&mut self) {
        self.marks.pop();
    }

    fn reset(&mut self) {
        if let Some(position) = self.marks.pop() {
            self.position = position;
            self.past_end = false;
        }
    }

    fn offset(&self) -> usize {
        self.position
    }
}
