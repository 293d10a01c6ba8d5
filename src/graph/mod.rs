//! Concept graph engine.
//!
//! Turns notes and their concepts into an undirected weighted graph, and
//! persists it to a flat text file.
//!
//! ## Architecture
//!
//! ```text
//! concepts ──► builder ──► KnowledgeGraph ──► codec ──► knowledge_graph.txt
//!                 │              ▲    │
//!            similarity          │    └──► analysis (related, clusters, stats)
//!                                └── codec (load)
//! ```
//!
//! ## Modules
//!
//! - [`models`]: Node, Edge, Vertex and the `KnowledgeGraph` aggregate
//! - [`similarity`]: `ScoringStrategy` (Jaccard, pairwise-match ratio)
//! - [`builder`]: `GraphBuilder` (incremental incorporate, full rebuild)
//! - [`codec`]: text format save/load
//! - [`analysis`]: read-only insight queries on a petgraph projection

pub mod analysis;
pub mod builder;
pub mod codec;
pub mod models;
pub mod similarity;

// Re-export primary types for convenience
pub use analysis::{
    concept_clusters, graph_stats, related_notes, top_concepts, ConceptFrequency, GraphStats,
    RelatedNote,
};
pub use builder::{GraphBuilder, Incorporated, NoteInput};
pub use codec::{load_graph, parse_graph, save_graph, to_text};
pub use models::{Edge, KnowledgeGraph, Node, Vertex};
pub use similarity::ScoringStrategy;
