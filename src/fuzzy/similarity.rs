// File: src/fuzzy/similarity.rs
use strsim::levenshtein;

/// `1 - distance / max_len`, clamped to `[0, 1]`, where distance is the
/// Levenshtein distance over Unicode scalar values.
///
/// Empty input on either side is degenerate and scores `0.0`, including
/// two empty strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let max_len = len_a.max(len_b) as f64;
    let distance = levenshtein(a, b) as f64;
    (1.0 - distance / max_len).clamp(0.0, 1.0)
}
