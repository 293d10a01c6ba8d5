//! Concept-set similarity.
//!
//! Two concepts are equal when their lower-cased forms are byte-equal.
//! `str::to_lowercase` applies the Unicode default mapping, independent of
//! the process locale.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// How two concept lists are turned into an edge weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// |A ∩ B| / |A ∪ B| over the deduplicated concept sets.
    #[default]
    Jaccard,
    /// Matching (a, b) pairs, duplicates included, over |A| + |B| − matches.
    #[serde(alias = "pairwise")]
    PairwiseMatch,
}

impl ScoringStrategy {
    /// Score two concept lists under this strategy.
    pub fn score<A, B>(self, a: &[A], b: &[B]) -> f64
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        match self {
            Self::Jaccard => jaccard(a, b),
            Self::PairwiseMatch => pairwise_match(a, b),
        }
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jaccard => write!(f, "jaccard"),
            Self::PairwiseMatch => write!(f, "pairwise_match"),
        }
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "jaccard" => Ok(Self::Jaccard),
            "pairwise_match" | "pairwise" => Ok(Self::PairwiseMatch),
            other => Err(format!(
                "unknown scoring strategy '{other}' (expected 'jaccard' or 'pairwise_match')"
            )),
        }
    }
}

/// Comparison key for a concept.
pub fn concept_key(concept: &str) -> String {
    concept.to_lowercase()
}

/// True when `concept` matches any entry of `concepts` case-insensitively.
pub fn contains_concept<S: AsRef<str>>(concepts: &[S], concept: &str) -> bool {
    let key = concept_key(concept);
    concepts.iter().any(|c| concept_key(c.as_ref()) == key)
}

/// Jaccard similarity of the two deduplicated, case-folded concept sets.
///
/// Returns 0.0 when the union is empty.
pub fn jaccard<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> f64 {
    let set_a: HashSet<String> = a.iter().map(|c| concept_key(c.as_ref())).collect();
    let set_b: HashSet<String> = b.iter().map(|c| concept_key(c.as_ref())).collect();

    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.len() + set_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Pairwise-match ratio.
///
/// Counts every (a, b) pair whose keys match, duplicates included, and divides
/// by `|A| + |B| - count`. A non-positive denominator yields 0.0. Inputs that
/// both carry duplicates can push the raw ratio past 1; it is clamped to 1.0.
pub fn pairwise_match<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> f64 {
    let keys_b: Vec<String> = b.iter().map(|c| concept_key(c.as_ref())).collect();

    let mut count: i64 = 0;
    for concept in a {
        let key = concept_key(concept.as_ref());
        count += keys_b.iter().filter(|k| **k == key).count() as i64;
    }

    let denominator = a.len() as i64 + b.len() as i64 - count;
    if denominator <= 0 {
        return 0.0;
    }
    (count as f64 / denominator as f64).min(1.0)
}
