use std::collections::HashMap;
use std::path::Path;

use trailmark_common::{TrailmarkError, TrailmarkResult};

use crate::normalize::normalize_name;

/// Known author-name variants mapped to their issue-tracker form
/// (`"Lastname, Firstname, Org"`).
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    exact: HashMap<String, String>,
    normalized: HashMap<String, String>,
}

impl AliasTable {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = Self::default();
        for (raw, canonical) in pairs {
            let raw = raw.as_ref().trim();
            let canonical = canonical.as_ref().trim();
            if raw.is_empty() || canonical.is_empty() {
                continue;
            }
            table
                .normalized
                .entry(normalize_name(raw))
                .or_insert_with(|| canonical.to_owned());
            table.exact.insert(raw.to_owned(), canonical.to_owned());
        }
        table
    }

    /// Load a JSON object of `"raw name": "canonical name"` entries.
    pub fn load(path: &Path) -> TrailmarkResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            TrailmarkError::Config(format!("cannot read alias file {}: {e}", path.display()))
        })?;
        let entries: HashMap<String, String> = serde_json::from_str(&text).map_err(|e| {
            TrailmarkError::Config(format!("invalid alias file {}: {e}", path.display()))
        })?;

        let table = Self::from_pairs(entries);
        tracing::info!(path = %path.display(), aliases = table.len(), "loaded alias table");
        Ok(table)
    }

    /// Exact raw-name match first, then a match on the normalized form.
    pub fn lookup(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        self.exact
            .get(raw)
            .or_else(|| self.normalized.get(&normalize_name(raw)))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}
