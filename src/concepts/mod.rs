//! Concept extraction
//!
//! The text-analysis collaborator of the graph: note text in, concepts out.
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `ConceptExtractor` trait: async interface
//! - `HttpConceptExtractor`: OpenAI-compatible chat-completions client
//! - `MockConceptExtractor`: deterministic mock for tests

pub mod mock;
pub mod provider;
pub mod traits;

pub use mock::MockConceptExtractor;
pub use provider::{parse_concepts, HttpConceptExtractor};
pub use traits::ConceptExtractor;
