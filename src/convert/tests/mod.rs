//! Shared helpers for conversion tests.

use std::collections::HashSet;


/// Owned string vector from literals.
pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Token set from literals.
pub fn token_set(tokens: &[&str]) -> HashSet<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}
