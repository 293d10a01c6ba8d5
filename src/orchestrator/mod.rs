//! Orchestrator module for coordinating the extractor, note store and graph

pub mod runner;

pub use runner::{AddedNote, ConceptUpdate, Orchestrator, RebuildReport};
