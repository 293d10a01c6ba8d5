//! Mock concept extractor for tests
//!
//! Deterministic and offline:
//! - texts registered with [`MockConceptExtractor::with`] return their fixed concepts
//! - texts registered with [`MockConceptExtractor::failing_on`] return an error
//! - anything else falls back to its distinct lower-cased words of 4+ letters

use super::traits::ConceptExtractor;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic mock extractor.
///
/// # Example
///
/// ```rust
/// use notegraph::concepts::{ConceptExtractor, MockConceptExtractor};
///
/// # tokio_test::block_on(async {
/// let extractor = MockConceptExtractor::new().with("note", &["a", "b"]);
/// assert_eq!(extractor.extract_concepts("note").await.unwrap(), vec!["a", "b"]);
///
/// // Fallback: distinct words of four letters or more
/// let words = extractor.extract_concepts("Rust graphs and Rust notes").await.unwrap();
/// assert_eq!(words, vec!["rust", "graphs", "notes"]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockConceptExtractor {
    fixed: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl MockConceptExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `concepts` for exactly `text`.
    pub fn with(mut self, text: &str, concepts: &[&str]) -> Self {
        self.fixed.insert(
            text.to_string(),
            concepts.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    /// Fail every call for exactly `text`.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Number of `extract_concepts` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fallback(text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() >= 4)
            .map(str::to_lowercase)
            .filter(|w| seen.insert(w.clone()))
            .collect()
    }
}

#[async_trait]
impl ConceptExtractor for MockConceptExtractor {
    async fn extract_concepts(&self, text: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(text) {
            anyhow::bail!("mock extractor refused '{text}'");
        }
        Ok(self
            .fixed
            .get(text)
            .cloned()
            .unwrap_or_else(|| Self::fallback(text)))
    }

    /// First sentence of the text.
    async fn summarize(&self, text: &str) -> Result<String> {
        if self.failing.contains(text) {
            anyhow::bail!("mock extractor refused '{text}'");
        }
        Ok(text.split('.').next().unwrap_or_default().trim().to_string())
    }

    fn model_name(&self) -> &str {
        "mock-concepts"
    }
}
