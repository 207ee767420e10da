//! Shared helpers for tokenizer tests.

use std::io::Cursor;

use crate::tokenizer::LineSource;

mod delimited_tests;

/// Line source over an in-memory text snippet.
pub fn source(text: &str) -> LineSource {
    LineSource::new(Box::new(Cursor::new(text.as_bytes().to_vec())))
}
