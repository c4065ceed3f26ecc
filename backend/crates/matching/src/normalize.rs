use similar::{ChangeTag, TextDiff};

/// Lower-case and keep only alphanumeric characters.
pub fn normalize_name(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Character-level similarity in 0..=100: twice the common subsequence length
/// over the combined length. Two empty strings are identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 100.0;
    }

    let diff = TextDiff::from_chars(a, b);
    let common = diff
        .iter_all_changes()
        .filter(|change| change.tag() == ChangeTag::Equal)
        .count();

    200.0 * common as f64 / total as f64
}
