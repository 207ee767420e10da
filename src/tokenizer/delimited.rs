//! Delimited-mode tokenizers.
//!
//! [`DelimitedTokenizer`] splits each line with a quote-aware state machine
//! honoring the dialect's quote, escape, doublequote, and
//! skip-initial-space rules. [`RegexTokenizer`] handles multi-character
//! separators by splitting trimmed lines with a compiled pattern, with no
//! quote-awareness.

use regex::Regex;

use super::dialect::{Dialect, QuotingMode};
use super::{LineSource, RawRow, RowTokenizer};
use crate::error::{ParseError, Result};

/// Quote-aware tokenizer for single-character delimiters.
pub struct DelimitedTokenizer {
    lines: LineSource,
    dialect: Dialect,
    delimiter: char,
}

impl DelimitedTokenizer {
    /// The dialect must carry a resolved delimiter; sniffing happens before
    /// construction.
    pub fn new(lines: LineSource, dialect: Dialect) -> Result<Self> {
        let delimiter = dialect.delimiter.ok_or_else(|| {
            ParseError::configuration("delimited tokenizer requires a resolved delimiter")
        })?;
        Ok(Self {
            lines,
            dialect,
            delimiter,
        })
    }

    /// Split one line into fields. `line_no` is the 1-based source line,
    /// used when a quote is left unterminated.
    pub fn split_line(dialect: &Dialect, delimiter: char, line: &str, line_no: usize) -> Result<RawRow> {
        let quote_aware = dialect.quoting != QuotingMode::None;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut after_delim = true;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if Some(c) == dialect.escape_char {
                    if let Some(next) = chars.next() {
                        field.push(next);
                        continue;
                    }
                }
                if c == dialect.quote_char {
                    if dialect.double_quote && chars.peek() == Some(&dialect.quote_char) {
                        chars.next();
                        field.push(dialect.quote_char);
                    } else {
                        in_quotes = false;
                    }
                } else {
                    field.push(c);
                }
                continue;
            }

            if Some(c) == dialect.escape_char {
                if let Some(next) = chars.next() {
                    field.push(next);
                    after_delim = false;
                    continue;
                }
            }

            if c == delimiter {
                fields.push(std::mem::take(&mut field));
                after_delim = true;
                if dialect.skip_initial_space {
                    while chars.peek() == Some(&' ') {
                        chars.next();
                    }
                }
            } else if quote_aware && c == dialect.quote_char && (after_delim || field.is_empty()) {
                in_quotes = true;
                after_delim = false;
            } else {
                field.push(c);
                after_delim = false;
            }
        }

        if in_quotes {
            return Err(ParseError::UnterminatedField { line: line_no });
        }

        fields.push(field);
        Ok(fields)
    }
}

impl RowTokenizer for DelimitedTokenizer {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        match self.lines.next_line()? {
            Some(line) => {
                let row =
                    Self::split_line(&self.dialect, self.delimiter, &line, self.lines.line_no())?;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }
}

/// Tokenizer for multi-character separators, treated as a regular
/// expression over trimmed lines. Quoting options are rejected for this
/// mode at configuration time, so no quote handling happens here.
pub struct RegexTokenizer {
    lines: LineSource,
    pattern: Regex,
}

impl RegexTokenizer {
    pub fn new(lines: LineSource, pattern: &str) -> Result<Self> {
        Ok(Self {
            lines,
            pattern: Regex::new(pattern)?,
        })
    }
}

impl RowTokenizer for RegexTokenizer {
    fn next_row(&mut self) -> Result<Option<RawRow>> {
        match self.lines.next_line()? {
            Some(line) => {
                let trimmed = line.trim();
                Ok(Some(
                    self.pattern
                        .split(trimmed)
                        .map(str::to_string)
                        .collect(),
                ))
            }
            None => Ok(None),
        }
    }
}
