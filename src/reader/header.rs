//! Header and hierarchical-column resolution.
//!
//! Consumes zero, one, or many designated header rows through the lookahead
//! buffer and produces column keys: synthesized positional names, mangled
//! duplicates, or per-level tuples when headers span multiple rows.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::options::{ColumnRef, HeaderSpec, IndexSpec, Options};
use crate::reader::buffer::RowBuffer;
use crate::value::ColumnKey;

/// Placeholder name for an empty header cell.
fn unnamed(position: usize) -> String {
    format!("Unnamed: {}", position)
}

fn unnamed_level(position: usize, level: usize) -> String {
    format!("Unnamed: {}_level_{}", position, level)
}

fn is_placeholder(name: &str) -> bool {
    name.contains("Unnamed")
}

/// Outcome of header inference: one name row per header level, the
/// pre-projection column count, and the usecols projection if any.
#[derive(Debug)]
pub(crate) struct HeaderResolution {
    pub levels: Vec<Vec<String>>,
    pub num_original_columns: usize,
    pub col_indices: Option<Vec<usize>>,
}

/// Read the designated header rows (if any) from the buffer and resolve
/// column names, duplicate mangling, and the usecols projection.
pub(crate) fn infer_columns(buf: &mut RowBuffer, opts: &Options) -> Result<HeaderResolution> {
    match &opts.header {
        HeaderSpec::None => infer_headerless(buf, opts),
        HeaderSpec::Row(row) => infer_from_rows(buf, opts, &[*row], false),
        HeaderSpec::Rows(rows) => {
            // One extra row after the last designated header row carries
            // index-level names rather than column names.
            let mut all = rows.clone();
            all.push(rows[rows.len() - 1] + 1);
            infer_from_rows(buf, opts, &all, true)
        }
    }
}

fn infer_from_rows(
    buf: &mut RowBuffer,
    opts: &Options,
    header_rows: &[usize],
    have_mi: bool,
) -> Result<HeaderResolution> {
    let mut levels: Vec<Vec<String>> = Vec::with_capacity(header_rows.len());
    let mut num_original_columns = 0;
    let mut clear_buffer = true;
    let last = header_rows.last().copied().unwrap_or(0);

    for (level, &hr) in header_rows.iter().enumerate() {
        let mut line = buf
            .buffered_line()?
            .ok_or_else(|| ParseError::header_inference("no rows to read header from"))?;
        while buf.pos() <= hr {
            line = buf.next_line()?.ok_or_else(|| {
                ParseError::header_inference(format!(
                    "header row {} is beyond the end of the data",
                    hr
                ))
            })?;
        }

        let mut unnamed_count = 0;
        let mut this_columns: Vec<String> = Vec::with_capacity(line.len());
        for (i, cell) in line.iter().enumerate() {
            if cell.is_empty() {
                this_columns.push(if have_mi {
                    unnamed_level(i, level)
                } else {
                    unnamed(i)
                });
                unnamed_count += 1;
            } else {
                this_columns.push(cell.clone());
            }
        }

        if !have_mi && opts.mangle_dupe_cols {
            mangle_duplicates(&mut this_columns);
        } else if have_mi && hr == last {
            // The extra row may actually be data: wider than its unnamed
            // count once index slots are discounted. Keep it buffered and
            // use a blank index-name row instead.
            let lc = this_columns.len();
            let ic = match &opts.index_col {
                IndexSpec::Columns(refs) => refs.len(),
                _ => 0,
            };
            if lc != unnamed_count && lc.saturating_sub(ic) > unnamed_count {
                clear_buffer = false;
                this_columns = vec![String::new(); lc];
                buf.keep_only_last();
            }
        }

        if levels.is_empty() {
            num_original_columns = this_columns.len();
        }
        levels.push(this_columns);
    }

    if clear_buffer {
        buf.clear();
    }

    if let Some(names) = &opts.names {
        let expected = match &opts.usecols {
            Some(usecols) => usecols.len(),
            None => levels[0].len(),
        };
        if names.len() != expected {
            return Err(ParseError::header_inference(
                "number of passed names did not match number of header fields in the file",
            ));
        }
        if opts.usecols.is_some() {
            let (_, col_indices) = handle_usecols(opts, vec![names.clone()], names)?;
            return Ok(HeaderResolution {
                levels: vec![names.clone()],
                num_original_columns,
                col_indices,
            });
        }
        return Ok(HeaderResolution {
            levels: vec![names.clone()],
            num_original_columns: names.len(),
            col_indices: None,
        });
    }

    let key = levels[0].clone();
    let (levels, col_indices) = handle_usecols(opts, levels, &key)?;
    debug!(
        columns = levels[0].len(),
        levels = levels.len(),
        "resolved header"
    );
    Ok(HeaderResolution {
        levels,
        num_original_columns,
        col_indices,
    })
}

fn infer_headerless(buf: &mut RowBuffer, opts: &Options) -> Result<HeaderResolution> {
    // An empty input is still meaningful when names are supplied: the
    // result has the right shape and zero rows.
    let ncols = match (buf.buffered_line()?, &opts.names) {
        (Some(line), _) => line.len(),
        (None, Some(names)) => names.len(),
        (None, None) => {
            return Err(ParseError::header_inference(
                "no rows to infer columns from",
            ))
        }
    };

    match &opts.names {
        None => {
            let base: Vec<String> = (0..ncols)
                .map(|i| match &opts.prefix {
                    Some(prefix) => format!("{}{}", prefix, i),
                    None => i.to_string(),
                })
                .collect();
            let (levels, col_indices) = handle_usecols(opts, vec![base.clone()], &base)?;
            Ok(HeaderResolution {
                levels,
                num_original_columns: ncols,
                col_indices,
            })
        }
        Some(names) => match &opts.usecols {
            Some(usecols) if names.len() != ncols => {
                if names.len() != usecols.len() {
                    return Err(ParseError::header_inference(
                        "number of passed names did not match number of header fields in the file",
                    ));
                }
                let (_, col_indices) = handle_usecols(opts, vec![names.clone()], names)?;
                Ok(HeaderResolution {
                    levels: vec![names.clone()],
                    num_original_columns: ncols,
                    col_indices,
                })
            }
            _ => {
                let (levels, col_indices) = handle_usecols(opts, vec![names.clone()], names)?;
                let width = levels[0].len();
                Ok(HeaderResolution {
                    levels,
                    num_original_columns: if opts.usecols.is_some() { ncols } else { width },
                    col_indices,
                })
            }
        },
    }
}

/// Suffix the i-th repeat of a name as `name.<i>`, in order of first
/// appearance.
fn mangle_duplicates(columns: &mut [String]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for col in columns.iter_mut() {
        let original = col.clone();
        let seen = *counts.get(&original).unwrap_or(&0);
        if seen > 0 {
            *col = format!("{}.{}", original, seen);
        }
        counts.insert(original, seen + 1);
    }
}

/// Apply the usecols projection to every header level and resolve the
/// retained positions.
fn handle_usecols(
    opts: &Options,
    levels: Vec<Vec<String>>,
    usecols_key: &[String],
) -> Result<(Vec<Vec<String>>, Option<Vec<usize>>)> {
    let usecols = match &opts.usecols {
        Some(usecols) => usecols,
        None => return Ok((levels, None)),
    };

    let mut positions = Vec::with_capacity(usecols.len());
    for col_ref in usecols {
        match col_ref {
            ColumnRef::Pos(p) => positions.push(*p),
            ColumnRef::Name(name) => {
                if levels.len() > 1 {
                    return Err(ParseError::column_selection(
                        "usecols must be positions when using multiple header rows",
                    ));
                }
                let p = usecols_key.iter().position(|c| c == name).ok_or_else(|| {
                    ParseError::column_selection(format!(
                        "usecols entry '{}' not found in columns",
                        name
                    ))
                })?;
                positions.push(p);
            }
        }
    }

    // Projection preserves source order regardless of spec order.
    let projected = levels
        .into_iter()
        .map(|level| {
            level
                .into_iter()
                .enumerate()
                .filter(|(i, _)| positions.contains(i))
                .map(|(_, name)| name)
                .collect()
        })
        .collect();
    Ok((projected, Some(positions)))
}

/// Build hierarchical column keys from multiple header levels, splitting
/// off the trailing index-name row.
///
/// Returns the positional key sequence (index slots included as scalar
/// placeholders) and the per-level index names.
pub(crate) fn extract_multi_indexer_columns(
    mut levels: Vec<Vec<String>>,
    index_positions: &[usize],
    header_rows: &[usize],
) -> Result<(Vec<ColumnKey>, Vec<Option<String>>)> {
    let index_row = match levels.pop() {
        Some(row) if !levels.is_empty() => row,
        _ => {
            return Err(ParseError::header_inference(
                "hierarchical columns need at least two header rows",
            ))
        }
    };
    let mut index_names: Vec<Option<String>> = index_positions
        .iter()
        .map(|&p| {
            index_row
                .get(p)
                .filter(|name| !name.is_empty())
                .cloned()
        })
        .collect();
    // A placeholder first index name means "no name".
    if let Some(first) = index_names.first_mut() {
        if first.as_deref().map_or(false, is_placeholder) {
            *first = None;
        }
    }

    let field_count = levels[0].len();
    let mut keys: Vec<ColumnKey> = Vec::with_capacity(field_count);
    let mut tuples: Vec<Vec<String>> = Vec::new();
    for pos in 0..field_count {
        if let Some(slot) = index_positions.iter().position(|&p| p == pos) {
            let name = index_names[slot]
                .clone()
                .unwrap_or_else(|| unnamed(pos));
            keys.push(ColumnKey::Scalar(name));
            continue;
        }
        let tuple: Vec<String> = levels
            .iter()
            .map(|row| row.get(pos).cloned().unwrap_or_default())
            .collect();
        tuples.push(tuple.clone());
        keys.push(ColumnKey::Tuple(tuple));
    }

    // If some level is a placeholder for every column, the header
    // specification names more rows than the hierarchy has.
    if !tuples.is_empty() {
        for level in 0..levels.len() {
            if tuples.iter().all(|t| is_placeholder(&t[level])) {
                return Err(ParseError::header_inference(format!(
                    "header rows {:?} are too many rows for this multi-index of columns",
                    header_rows
                )));
            }
        }
    }

    Ok((keys, index_names))
}
