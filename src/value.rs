//! Core value types produced by the parsing pipeline.
//!
//! A parsed column is a tagged variant over text, integer, floating,
//! boolean, and temporal payloads. Coercion functions in [`crate::convert`]
//! are pure transitions between these variants; nothing here inspects
//! runtime types.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDateTime;

/// A column identifier: a scalar name, or a tuple of per-level names when
/// headers span multiple rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKey {
    Scalar(String),
    Tuple(Vec<String>),
}

impl ColumnKey {
    /// Scalar name of this key, if it has one.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ColumnKey::Scalar(name) => Some(name),
            ColumnKey::Tuple(_) => None,
        }
    }

    /// Whether this key's display form equals the given name.
    ///
    /// Tuple keys match on their first level so that single-level lookups
    /// (index names, converters) keep working against hierarchical columns.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            ColumnKey::Scalar(s) => s == name,
            ColumnKey::Tuple(levels) => levels.first().map(String::as_str) == Some(name),
        }
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Scalar(s) => write!(f, "{}", s),
            ColumnKey::Tuple(levels) => write!(f, "({})", levels.join(", ")),
        }
    }
}

impl From<&str> for ColumnKey {
    fn from(name: &str) -> Self {
        ColumnKey::Scalar(name.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(name: String) -> Self {
        ColumnKey::Scalar(name)
    }
}

/// A homogeneous, typed column array.
///
/// Integer columns carry no missing marker; when a missing value appears
/// during coercion the column is widened to `Float` with `NaN` holes, which
/// is the observed behavior this crate preserves.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Raw or degraded text; `None` marks a recognized NA token.
    Text(Vec<Option<String>>),
    Int(Vec<i64>),
    /// `NaN` entries mark missing values.
    Float(Vec<f64>),
    Bool(Vec<Option<bool>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Text(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of missing entries in this column.
    pub fn na_count(&self) -> usize {
        match self {
            Column::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            Column::Int(_) => 0,
            Column::Float(v) => v.iter().filter(|x| x.is_nan()).count(),
            Column::Bool(v) => v.iter().filter(|x| x.is_none()).count(),
            Column::DateTime(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// String form of every entry, with missing entries rendered empty.
    ///
    /// Used when a typed column feeds back into date fusion.
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Column::Text(v) => v
                .iter()
                .map(|x| x.clone().unwrap_or_default())
                .collect(),
            Column::Int(v) => v.iter().map(|x| x.to_string()).collect(),
            Column::Float(v) => v
                .iter()
                .map(|x| if x.is_nan() { String::new() } else { x.to_string() })
                .collect(),
            Column::Bool(v) => v
                .iter()
                .map(|x| x.map(|b| b.to_string()).unwrap_or_default())
                .collect(),
            Column::DateTime(v) => v
                .iter()
                .map(|x| x.map(|d| d.to_string()).unwrap_or_default())
                .collect(),
        }
    }
}

/// Row index descriptor returned with every chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum RowIndex {
    /// No index column; rows are implicitly numbered `0..n`.
    Range(usize),
    /// A single index column.
    Single {
        name: Option<String>,
        values: Column,
    },
    /// A hierarchical index of two or more levels.
    Multi {
        names: Vec<Option<String>>,
        levels: Vec<Column>,
    },
}

impl RowIndex {
    /// Number of rows described by this index.
    pub fn len(&self) -> usize {
        match self {
            RowIndex::Range(n) => *n,
            RowIndex::Single { values, .. } => values.len(),
            RowIndex::Multi { levels, .. } => levels.first().map_or(0, Column::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One materialized chunk: a row index descriptor, the ordered column keys,
/// and the mapping from key to typed column array.
///
/// Constructed fresh per `read` call; ownership passes to the caller, the
/// reader retains nothing.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub index: RowIndex,
    pub columns: Vec<ColumnKey>,
    pub data: HashMap<ColumnKey, Column>,
}

impl ParseResult {
    /// Convenience accessor: column by display name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|k| k.matches(name))
            .and_then(|k| self.data.get(k))
    }

    /// Number of data rows in this chunk.
    pub fn row_count(&self) -> usize {
        self.columns
            .first()
            .and_then(|k| self.data.get(k))
            .map_or_else(|| self.index.len(), Column::len)
    }
}
