//! Tokenization dialect: delimiter, quoting, and escaping rules.
//!
//! A dialect is resolved once, sniffed from data when the delimiter is
//! unset, and is immutable for the rest of the stream.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Quoting behavior for the delimited tokenizer.
///
/// Only `None` changes read-side behavior (quote characters become literal
/// data); the remaining modes matter to writers and are accepted for
/// dialect round-tripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuotingMode {
    Minimal,
    All,
    NonNumeric,
    None,
}

impl Default for QuotingMode {
    fn default() -> Self {
        QuotingMode::Minimal
    }
}

/// The set of tokenization rules governing how a line becomes fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    /// Field separator; `None` means "sniff from the first data line".
    pub delimiter: Option<char>,
    pub quote_char: char,
    pub escape_char: Option<char>,
    /// Treat a doubled quote inside a quoted field as a literal quote.
    pub double_quote: bool,
    /// Discard whitespace immediately following a delimiter.
    pub skip_initial_space: bool,
    pub quoting: QuotingMode,
    /// Line terminator override; rejected at configuration time.
    pub line_terminator: Option<char>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: None,
            quote_char: '"',
            escape_char: None,
            double_quote: true,
            skip_initial_space: false,
            quoting: QuotingMode::default(),
            line_terminator: None,
        }
    }
}

/// Candidate separators tried by the sniffer, in tie-breaking order.
const SNIFF_CANDIDATES: &[char] = &[',', '\t', ';', '|', ':', ' '];

impl Dialect {
    /// Whether quote-related options are all at their defaults, which the
    /// regex separator mode requires.
    pub fn has_default_quoting(&self) -> bool {
        self.quote_char == '"'
            && self.escape_char.is_none()
            && self.double_quote
            && !self.skip_initial_space
            && self.quoting == QuotingMode::default()
    }

    /// Sniff the delimiter from one sample line by frequency analysis of
    /// candidate separators outside quoted regions. Ties break in candidate
    /// order; a line with no candidate at all falls back to a comma.
    pub fn sniff_delimiter(&self, line: &str) -> char {
        let mut counts = [0usize; 6];
        let mut in_quotes = false;
        for c in line.chars() {
            if c == self.quote_char && self.quoting != QuotingMode::None {
                in_quotes = !in_quotes;
                continue;
            }
            if in_quotes {
                continue;
            }
            if let Some(i) = SNIFF_CANDIDATES.iter().position(|&cand| cand == c) {
                counts[i] += 1;
            }
        }

        // Strictly-greater keeps earlier candidates on ties.
        let mut best = ',';
        let mut best_count = 0;
        for (&cand, &n) in SNIFF_CANDIDATES.iter().zip(counts.iter()) {
            if n > best_count {
                best = cand;
                best_count = n;
            }
        }
        debug!(delimiter = %best.escape_debug(), "sniffed field delimiter");
        best
    }

    /// Copy of this dialect with the delimiter locked to `delim`.
    pub fn with_delimiter(&self, delim: char) -> Self {
        Self {
            delimiter: Some(delim),
            ..self.clone()
        }
    }
}
