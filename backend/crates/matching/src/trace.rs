use serde::{Deserialize, Serialize};

/// How a raw author name reached its canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Alias table hit on `matched`, either the raw name or its representative.
    Alias { matched: String },
    /// Grouped onto an earlier, similar name.
    Similarity { representative: String, score: f64 },
    /// Kept as written.
    Own,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub raw: String,
    pub canonical: String,
    pub source: ResolutionSource,
}
