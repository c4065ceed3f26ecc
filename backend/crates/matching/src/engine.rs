use std::collections::{HashMap, HashSet};

use crate::aliases::AliasTable;
use crate::config::MatchingConfig;
use crate::normalize::{normalize_name, similarity_ratio};
use crate::trace::{Resolution, ResolutionSource};

#[derive(Debug, Clone)]
struct Assignment {
    representative: String,
    score: f64,
}

/// Maps raw commit-author names onto canonical identities.
///
/// Built once from every author name of a run. Names are visited in
/// first-seen order; each name not yet claimed becomes the representative
/// of all unclaimed names whose normalized form scores at or above the
/// similarity threshold against it. The alias table then overrides the
/// representative when it knows the raw name or the representative.
#[derive(Debug, Clone)]
pub struct NameReconciler {
    config: MatchingConfig,
    aliases: AliasTable,
    order: Vec<String>,
    assignments: HashMap<String, Assignment>,
}

impl NameReconciler {
    pub fn build<I, S>(config: MatchingConfig, aliases: AliasTable, raw_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let order: Vec<String> = raw_names
            .into_iter()
            .map(|n| n.as_ref().trim().to_owned())
            .filter(|n| !n.is_empty() && seen.insert(n.clone()))
            .collect();
        let normalized: Vec<String> = order.iter().map(|n| normalize_name(n)).collect();

        let mut assignments: HashMap<String, Assignment> = HashMap::with_capacity(order.len());
        for (i, name) in order.iter().enumerate() {
            if assignments.contains_key(name) {
                continue;
            }
            for (j, candidate) in order.iter().enumerate() {
                if assignments.contains_key(candidate) {
                    continue;
                }
                let score = similarity_ratio(&normalized[i], &normalized[j]);
                if score >= config.similarity_threshold {
                    assignments.insert(
                        candidate.clone(),
                        Assignment {
                            representative: name.clone(),
                            score,
                        },
                    );
                }
            }
        }

        let groups = assignments
            .values()
            .map(|a| a.representative.as_str())
            .collect::<HashSet<_>>()
            .len();
        tracing::debug!(names = order.len(), groups, "built name reconciler");

        Self {
            config,
            aliases,
            order,
            assignments,
        }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Canonical identity for a commit author.
    pub fn canonical_author(&self, raw: &str) -> String {
        self.resolve(raw).canonical
    }

    /// Issue-tracker assignees are already canonical; only the alias table applies.
    pub fn canonical_assignee(&self, raw: &str) -> String {
        let raw = raw.trim();
        self.aliases
            .lookup(raw)
            .map(str::to_owned)
            .unwrap_or_else(|| raw.to_owned())
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let raw = raw.trim();

        if let Some(canonical) = self.aliases.lookup(raw) {
            return Resolution {
                raw: raw.to_owned(),
                canonical: canonical.to_owned(),
                source: ResolutionSource::Alias {
                    matched: raw.to_owned(),
                },
            };
        }

        let Some(assignment) = self.assignments.get(raw) else {
            return Resolution {
                raw: raw.to_owned(),
                canonical: raw.to_owned(),
                source: ResolutionSource::Own,
            };
        };

        if let Some(canonical) = self.aliases.lookup(&assignment.representative) {
            return Resolution {
                raw: raw.to_owned(),
                canonical: canonical.to_owned(),
                source: ResolutionSource::Alias {
                    matched: assignment.representative.clone(),
                },
            };
        }

        let source = if assignment.representative == raw {
            ResolutionSource::Own
        } else {
            ResolutionSource::Similarity {
                representative: assignment.representative.clone(),
                score: assignment.score,
            }
        };
        Resolution {
            raw: raw.to_owned(),
            canonical: assignment.representative.clone(),
            source,
        }
    }

    /// Resolution of every name the reconciler was built from, in first-seen order.
    pub fn trace(&self) -> Vec<Resolution> {
        self.order.iter().map(|n| self.resolve(n)).collect()
    }
}
