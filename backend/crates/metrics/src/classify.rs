//! Work classification: maps issue types to bug / feature / chore categories.
//!
//! Unmatched types fall back to chore. Extend the slices below to cover
//! additional issue types.

use serde::Serialize;

/// Issue types classified as **bug** (EN + RU).
pub const BUG_ISSUE_TYPES: &[&str] = &["Bug", "Defect", "Баг", "Дефект", "Ошибка"];

/// Issue types classified as **feature** (EN + RU).
pub const FEATURE_ISSUE_TYPES: &[&str] = &[
    "Story",
    "Epic",
    "New Feature",
    "Improvement",
    "История",
    "Эпик",
    "Новая функция",
    "Улучшение",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkCategory {
    Bug,
    Feature,
    Chore,
}

impl WorkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkCategory::Bug => "bug",
            WorkCategory::Feature => "feature",
            WorkCategory::Chore => "chore",
        }
    }
}

/// Case-insensitive match against the known issue types.
pub fn classify_issue_type(issue_type: &str) -> WorkCategory {
    let t = issue_type.trim().to_lowercase();
    let matches = |types: &[&str]| types.iter().any(|k| k.to_lowercase() == t);

    if matches(BUG_ISSUE_TYPES) {
        WorkCategory::Bug
    } else if matches(FEATURE_ISSUE_TYPES) {
        WorkCategory::Feature
    } else {
        WorkCategory::Chore
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bug_types_classify_as_bug() {
        assert_eq!(classify_issue_type("Bug"), WorkCategory::Bug);
        assert_eq!(classify_issue_type("defect"), WorkCategory::Bug);
        assert_eq!(classify_issue_type("Ошибка"), WorkCategory::Bug);
    }

    #[test]
    fn feature_types_classify_as_feature() {
        assert_eq!(classify_issue_type("Story"), WorkCategory::Feature);
        assert_eq!(classify_issue_type(" new feature "), WorkCategory::Feature);
        assert_eq!(classify_issue_type("Улучшение"), WorkCategory::Feature);
    }

    #[test]
    fn unknown_and_empty_fall_back_to_chore() {
        assert_eq!(classify_issue_type("Task"), WorkCategory::Chore);
        assert_eq!(classify_issue_type(""), WorkCategory::Chore);
    }

    #[test]
    fn no_overlap_between_bug_and_feature_issue_types() {
        for t in BUG_ISSUE_TYPES {
            assert!(!FEATURE_ISSUE_TYPES.contains(t), "{t} is in both lists");
        }
    }
}
