//! Row-index assignment.
//!
//! Resolves an explicit, implicit, or name-matched index specification to
//! concrete column positions and per-level names, removing index columns
//! from the column-key sequence.

use crate::error::{ParseError, Result};
use crate::options::ColumnRef;
use crate::value::ColumnKey;

/// Resolve index references against the column keys, removing each
/// referenced column from `columns` and collecting per-level names.
///
/// Positions are resolved against the original (pre-removal) key order, so
/// a mixed name/position spec cannot shift underneath itself. The first
/// index name is normalized to `None` when it is a placeholder.
pub(crate) fn clean_index_names(
    columns: &mut Vec<ColumnKey>,
    index_refs: &[ColumnRef],
) -> Result<(Vec<Option<String>>, Vec<usize>)> {
    let original = columns.clone();
    let mut index_names: Vec<Option<String>> = Vec::with_capacity(index_refs.len());
    let mut positions: Vec<usize> = Vec::with_capacity(index_refs.len());

    for col_ref in index_refs {
        let pos = match col_ref {
            ColumnRef::Pos(p) => {
                if *p >= original.len() {
                    return Err(ParseError::column_selection(format!(
                        "index column position {} out of range for {} columns",
                        p,
                        original.len()
                    )));
                }
                *p
            }
            ColumnRef::Name(name) => original
                .iter()
                .position(|key| key.matches(name))
                .ok_or_else(|| {
                    ParseError::column_selection(format!(
                        "index column '{}' not found in columns",
                        name
                    ))
                })?,
        };
        positions.push(pos);
        let key = &original[pos];
        index_names.push(match key {
            ColumnKey::Scalar(name) if !name.is_empty() => Some(name.clone()),
            ColumnKey::Tuple(levels) => levels.first().filter(|n| !n.is_empty()).cloned(),
            _ => None,
        });
        if let Some(i) = columns.iter().position(|k| k == key) {
            columns.remove(i);
        }
    }

    if let Some(first) = index_names.first_mut() {
        if first
            .as_deref()
            .map_or(false, |name| name.contains("Unnamed"))
        {
            *first = None;
        }
    }

    Ok((index_names, positions))
}
