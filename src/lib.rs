//! textframe
//!
//! A Rust library for parsing delimited and fixed-width text into typed,
//! labeled columns.
//!
//! This library provides tools for:
//! - Quote-aware, regex, and fixed-width tokenization with delimiter sniffing
//! - Single- and multi-row header resolution with duplicate-name mangling
//! - Explicit, implicit, and hierarchical row-index assignment
//! - Missing-value detection with configurable per-column token sets
//! - Per-column type coercion to integer, float, boolean, or text
//! - Date parsing and multi-column date fusion
//! - Chunked streaming reads over large inputs
//!
//! The entry point is [`TextReader`], configured through
//! [`Options::builder`]:
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use textframe::{Options, TextReader};
//!
//! # fn main() -> textframe::Result<()> {
//! let opts = Options::builder().sep(",").build()?;
//! let file = BufReader::new(File::open("observations.csv")?);
//! let mut reader = TextReader::from_reader(file, opts)?;
//! while let Some(chunk) = reader.read(Some(10_000))? {
//!     println!("{} rows", chunk.row_count());
//! }
//! # Ok(())
//! # }
//! ```

pub mod convert;
pub mod error;
pub mod options;
pub mod reader;
pub mod tokenizer;
pub mod value;

// Re-export commonly used types
pub use error::{ParseError, Result};
pub use options::{
    ColSpecs, ColumnRef, Converter, DateGroup, DateParserFn, DateSpec, HeaderSpec, IndexSpec,
    NaValues, Options, OptionsBuilder,
};
pub use reader::TextReader;
pub use tokenizer::dialect::{Dialect, QuotingMode};
pub use value::{Column, ColumnKey, ParseResult, RowIndex};
