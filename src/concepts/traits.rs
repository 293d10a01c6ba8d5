//! ConceptExtractor trait definition
//!
//! Abstract interface for the text-analysis collaborator that turns note text
//! into concepts. Same shape as the other collaborator seams of the crate:
//! async trait + Send + Sync for `Arc<dyn ConceptExtractor>` usage.

use anyhow::Result;
use async_trait::async_trait;

/// Turns free text into an ordered list of concept strings.
///
/// # Implementations
///
/// - [`HttpConceptExtractor`](super::HttpConceptExtractor): any OpenAI-compatible
///   chat-completions endpoint
/// - [`MockConceptExtractor`](super::MockConceptExtractor): deterministic, offline
#[async_trait]
pub trait ConceptExtractor: Send + Sync {
    /// Extract the main concepts of `text`, in the order the analyser gives them.
    ///
    /// # Errors
    ///
    /// Any failure of the underlying service. Callers must not substitute an
    /// empty concept list for a failed call.
    async fn extract_concepts(&self, text: &str) -> Result<Vec<String>>;

    /// Short summary of `text`, used as node text when summaries are enabled.
    ///
    /// The default returns the text unchanged.
    async fn summarize(&self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    /// Name of the model behind this extractor.
    fn model_name(&self) -> &str;
}
