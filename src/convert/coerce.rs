//! Per-column type coercion strategies.
//!
//! Strategies form an explicit ordered list; each either claims the column
//! or declines, and the first success wins. The text fallback always
//! succeeds, so coercion never raises.

use std::collections::HashSet;

use crate::value::Column;

/// Default tokens recognized as boolean literals.
const DEFAULT_TRUE: &[&str] = &["True", "TRUE", "true"];
const DEFAULT_FALSE: &[&str] = &["False", "FALSE", "false"];

/// Resolved true/false token sets for boolean inference.
#[derive(Debug, Clone)]
pub struct BoolTokens {
    true_values: HashSet<String>,
    false_values: HashSet<String>,
}

impl BoolTokens {
    /// Built-in tokens extended with user-configured ones.
    pub fn resolve(true_values: &[String], false_values: &[String]) -> Self {
        let mut t: HashSet<String> = DEFAULT_TRUE.iter().map(|s| s.to_string()).collect();
        t.extend(true_values.iter().cloned());
        let mut f: HashSet<String> = DEFAULT_FALSE.iter().map(|s| s.to_string()).collect();
        f.extend(false_values.iter().cloned());
        Self {
            true_values: t,
            false_values: f,
        }
    }
}

/// One coercion attempt: `Some((column, na_count))` on success, `None` when
/// the strategy does not apply to these values.
type Strategy = fn(&[String], &HashSet<String>, &BoolTokens) -> Option<(Column, usize)>;

/// Ordered list of inference strategies tried before the text fallback.
const STRATEGIES: &[Strategy] = &[try_numeric, try_boolean];

/// Convert one column's raw values into a typed array, returning the array
/// and the number of NA substitutions made.
pub fn coerce_column(
    values: &[String],
    na_tokens: &HashSet<String>,
    bools: &BoolTokens,
) -> (Column, usize) {
    for strategy in STRATEGIES {
        if let Some(result) = strategy(values, na_tokens, bools) {
            return result;
        }
    }
    text_na_scan(values, na_tokens)
}

/// Full numeric parse. Integers stay integral unless a missing value or a
/// fractional literal appears, in which case the column widens to floating
/// with `NaN` holes. Any unparseable non-NA value declines the column.
fn try_numeric(
    values: &[String],
    na_tokens: &HashSet<String>,
    _bools: &BoolTokens,
) -> Option<(Column, usize)> {
    let mut ints: Vec<i64> = Vec::with_capacity(values.len());
    let mut floats: Vec<f64> = Vec::with_capacity(values.len());
    let mut all_int = true;
    let mut na_count = 0;

    for value in values {
        let trimmed = value.trim();
        if na_tokens.contains(trimmed) {
            na_count += 1;
            all_int = false;
            floats.push(f64::NAN);
            continue;
        }
        if all_int {
            if let Ok(i) = trimmed.parse::<i64>() {
                ints.push(i);
                floats.push(i as f64);
                continue;
            }
        }
        match trimmed.parse::<f64>() {
            Ok(f) => {
                all_int = false;
                floats.push(f);
            }
            Err(_) => return None,
        }
    }

    if all_int {
        Some((Column::Int(ints), na_count))
    } else {
        Some((Column::Float(floats), na_count))
    }
}

/// Boolean inference: claims the column only when every non-NA value is a
/// recognized true/false token.
fn try_boolean(
    values: &[String],
    na_tokens: &HashSet<String>,
    bools: &BoolTokens,
) -> Option<(Column, usize)> {
    let mut out: Vec<Option<bool>> = Vec::with_capacity(values.len());
    let mut na_count = 0;

    for value in values {
        let trimmed = value.trim();
        if na_tokens.contains(trimmed) {
            na_count += 1;
            out.push(None);
        } else if bools.true_values.contains(trimmed) {
            out.push(Some(true));
        } else if bools.false_values.contains(trimmed) {
            out.push(Some(false));
        } else {
            return None;
        }
    }
    Some((Column::Bool(out), na_count))
}

/// Text fallback: keep values as strings, masking NA tokens only.
pub fn text_na_scan(values: &[String], na_tokens: &HashSet<String>) -> (Column, usize) {
    let mut na_count = 0;
    let out = values
        .iter()
        .map(|v| {
            if na_tokens.contains(v.trim()) {
                na_count += 1;
                None
            } else {
                Some(v.clone())
            }
        })
        .collect();
    (Column::Text(out), na_count)
}
