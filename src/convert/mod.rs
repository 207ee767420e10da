//! Missing-value detection and per-column type coercion.
//!
//! Each column is converted independently: a registered converter wins,
//! otherwise an explicit ordered list of strategies is tried (full numeric
//! parse, then boolean inference), falling back to text with an NA-token
//! scan. Coercion never raises; failure degrades to text.

pub mod coerce;
pub mod dates;
pub mod na;

#[cfg(test)]
pub mod tests;

pub use coerce::{coerce_column, text_na_scan, BoolTokens};
pub use na::{stringify_na_tokens, NaProfile, DEFAULT_NA_VALUES};

use crate::value::Column;

/// A column mid-pipeline: still raw text, or already parsed by date fusion.
#[derive(Debug, Clone)]
pub enum PendingColumn {
    Raw(Vec<String>),
    Parsed(Column),
}

impl PendingColumn {
    pub fn len(&self) -> usize {
        match self {
            PendingColumn::Raw(v) => v.len(),
            PendingColumn::Parsed(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// String form of every entry, for feeding into date fusion.
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            PendingColumn::Raw(v) => v.clone(),
            PendingColumn::Parsed(c) => c.to_strings(),
        }
    }
}
