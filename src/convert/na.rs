//! Missing-value token sets.
//!
//! The universal default set is fixed and language-independent; user tokens
//! are appended to it (never replacing it) unless defaults are explicitly
//! disabled. Numeric-literal user tokens also match their float/integer
//! spellings, so `na_values=["999"]` recognizes both `999` and `999.0`.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

use crate::options::NaValues;
use crate::value::ColumnKey;

/// Universal default NA tokens, recognized unless explicitly disabled.
pub static DEFAULT_NA_VALUES: Lazy<HashSet<String>> = Lazy::new(|| {
    [
        "-1.#IND", "1.#QNAN", "1.#IND", "-1.#QNAN", "#N/A", "N/A", "NA", "#NA", "NULL", "NaN",
        "-NaN", "nan", "-nan", "",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

/// Expand user tokens with their numeric-literal equivalents.
pub fn stringify_na_tokens<I, S>(tokens: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = HashSet::new();
    for token in tokens {
        let token = token.as_ref();
        result.insert(token.to_string());
        if let Ok(v) = token.parse::<f64>() {
            if v.is_finite() && v.fract() == 0.0 {
                result.insert(format!("{}.0", v as i64));
                result.insert((v as i64).to_string());
            }
            result.insert(v.to_string());
        }
    }
    result
}

/// Resolved NA token sets: one global set plus per-column overrides.
#[derive(Debug, Clone)]
pub struct NaProfile {
    global: HashSet<String>,
    per_column: HashMap<String, HashSet<String>>,
}

impl NaProfile {
    /// Resolve the configured NA values once, before any row is converted.
    pub fn resolve(na_values: &NaValues, keep_default_na: bool) -> Self {
        let defaults = || DEFAULT_NA_VALUES.clone();
        match na_values {
            NaValues::Default => Self {
                global: if keep_default_na {
                    defaults()
                } else {
                    HashSet::new()
                },
                per_column: HashMap::new(),
            },
            NaValues::Tokens(tokens) => {
                let mut global = stringify_na_tokens(tokens);
                if keep_default_na {
                    global.extend(defaults());
                }
                Self {
                    global,
                    per_column: HashMap::new(),
                }
            }
            NaValues::PerColumn(map) => {
                let per_column = map
                    .iter()
                    .map(|(name, tokens)| {
                        let mut set = stringify_na_tokens(tokens);
                        if keep_default_na {
                            set.extend(defaults());
                        }
                        (name.clone(), set)
                    })
                    .collect();
                // Columns without an override fall back to the defaults,
                // regardless of keep_default_na.
                Self {
                    global: defaults(),
                    per_column,
                }
            }
        }
    }

    /// Token set in effect for the named column.
    pub fn tokens_for_name(&self, name: &str) -> &HashSet<String> {
        self.per_column.get(name).unwrap_or(&self.global)
    }

    /// Token set in effect for a column key; tuple keys match on their
    /// first level.
    pub fn tokens_for(&self, key: &ColumnKey) -> &HashSet<String> {
        match key {
            ColumnKey::Scalar(name) => self.tokens_for_name(name),
            ColumnKey::Tuple(levels) => levels
                .first()
                .map(|n| self.tokens_for_name(n))
                .unwrap_or(&self.global),
        }
    }

    /// The global token set.
    pub fn global(&self) -> &HashSet<String> {
        &self.global
    }
}
