//! Shared helpers for reader pipeline tests.

use std::io::Cursor;

use crate::options::Options;
use crate::reader::buffer::RowBuffer;
use crate::reader::TextReader;
use crate::tokenizer::{PresplitRows, RawRow};

mod reader_tests;

/// Owned rows from string literals.
pub fn rows(data: &[&[&str]]) -> Vec<RawRow> {
    data.iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect()
}

/// Buffer over in-memory rows with no skips and no comment marker.
pub fn buffer(data: &[&[&str]]) -> RowBuffer {
    RowBuffer::new(Box::new(PresplitRows::new(rows(data))), Default::default(), None)
}

/// Reader over an in-memory text snippet.
pub fn reader(text: &str, opts: Options) -> TextReader {
    TextReader::from_reader(Cursor::new(text.as_bytes().to_vec()), opts)
        .expect("reader construction failed")
}
