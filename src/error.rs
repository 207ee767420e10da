//! Error handling for text-to-table parsing operations.
//!
//! Provides error types with context for configuration validation,
//! tokenization, structural checks, and date fusion failures.

use thiserror::Error;

/// Errors raised while configuring or running a [`TextReader`](crate::TextReader).
///
/// Configuration and structural errors are fatal and carry enough context to
/// locate the offending option or source line. Type coercion never raises;
/// it degrades a column to text instead.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("EOF inside quoted field starting at line {line}")]
    UnterminatedField { line: usize },

    #[error("Expected {expected} fields in line {line}, saw {observed}")]
    FieldCount {
        expected: usize,
        observed: usize,
        line: usize,
    },

    #[error("Header inference failed: {message}")]
    HeaderInference { message: String },

    #[error("Column selection error: {message}")]
    ColumnSelection { message: String },

    #[error("Date fusion error: {message}")]
    DateFusion { message: String },

    #[error("Invalid separator pattern: {0}")]
    SeparatorPattern(#[from] regex::Error),
}

impl ParseError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a header inference error
    pub fn header_inference(message: impl Into<String>) -> Self {
        Self::HeaderInference {
            message: message.into(),
        }
    }

    /// Create a column selection error
    pub fn column_selection(message: impl Into<String>) -> Self {
        Self::ColumnSelection {
            message: message.into(),
        }
    }

    /// Create a date fusion error
    pub fn date_fusion(message: impl Into<String>) -> Self {
        Self::DateFusion {
            message: message.into(),
        }
    }
}

/// Result type alias for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
