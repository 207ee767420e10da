//! Turning a line-oriented text stream into rows of raw string fields.
//!
//! Two strategies, selected by configuration and never mixed:
//! - [`delimited`]: quote-aware state-machine splitting for single-character
//!   separators, or regex splitting for multi-character patterns
//! - [`fixed_width`]: extraction by half-open character intervals, inferred
//!   from sample rows when not supplied
//!
//! Every tokenizer yields [`RawRow`]s lazily through [`RowTokenizer`];
//! restart is possible only through the reader's lookahead buffer.

pub mod delimited;
pub mod dialect;
pub mod fixed_width;

#[cfg(test)]
pub mod tests;

use std::io::BufRead;

use crate::error::Result;

pub use delimited::{DelimitedTokenizer, RegexTokenizer};
pub use dialect::{Dialect, QuotingMode};
pub use fixed_width::FixedWidthTokenizer;

/// An ordered sequence of raw string fields from one logical input line.
pub type RawRow = Vec<String>;

/// A lazy source of tokenized rows.
pub trait RowTokenizer {
    /// Next row, or `None` when the stream is exhausted.
    fn next_row(&mut self) -> Result<Option<RawRow>>;
}

/// Tokenizer over an in-memory sequence of pre-split rows, for callers whose
/// source is not line-oriented text.
pub struct PresplitRows {
    rows: std::vec::IntoIter<RawRow>,
}

impl PresplitRows {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl RowTokenizer for PresplitRows {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        Ok(self.rows.next())
    }
}

/// Line reader over any `BufRead`, stripping `\n` and `\r\n` terminators and
/// tracking the 1-based number of the line just read.
pub struct LineSource {
    inner: Box<dyn BufRead>,
    line_no: usize,
}

impl LineSource {
    pub fn new(inner: Box<dyn BufRead>) -> Self {
        Self { inner, line_no: 0 }
    }

    /// 1-based number of the most recently read line.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    /// Read one line without its terminator; `None` at end of stream.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        let n = self.inner.read_line(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        Ok(Some(buf))
    }
}
