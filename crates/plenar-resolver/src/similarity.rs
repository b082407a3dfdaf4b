//! String normalization and similarity measures

use std::collections::HashSet;

/// Lowercase with `ß` folded to `ss`
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('ß', "ss")
}

/// Normalized whitespace-separated tokens
pub fn name_tokens(names: &str) -> HashSet<String> {
    names.split_whitespace().map(normalize_name).collect()
}

/// Normalized Levenshtein similarity in `[0, 1]`, case-insensitive
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_name(a), &normalize_name(b))
}
