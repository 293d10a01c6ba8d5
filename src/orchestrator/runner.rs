//! Main orchestrator runner

use crate::concepts::ConceptExtractor;
use crate::error::GraphError;
use crate::graph::{load_graph, save_graph, GraphBuilder, KnowledgeGraph, NoteInput};
use crate::store::NoteStore;
use crate::Config;
use std::sync::Arc;

/// Outcome of [`Orchestrator::add_note`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedNote {
    /// Id in the note store
    pub note_id: i64,
    /// Id of the new graph node
    pub node_id: i64,
    pub edges_added: usize,
    pub vertices_added: usize,
}

/// Outcome of [`Orchestrator::update_all_concepts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConceptUpdate {
    pub updated: usize,
    pub failed: usize,
}

/// Outcome of [`Orchestrator::rebuild`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub concepts: ConceptUpdate,
    pub nodes: usize,
    pub edges: usize,
    pub vertices: usize,
}

/// Drives the extractor, the note store, the builder and the graph file.
///
/// Owns the in-memory graph; every mutating call saves it before returning.
pub struct Orchestrator {
    config: Config,
    extractor: Arc<dyn ConceptExtractor>,
    store: Arc<dyn NoteStore>,
    builder: GraphBuilder,
    graph: KnowledgeGraph,
}

impl Orchestrator {
    /// Load the graph file, or create and save an empty graph when it is missing.
    pub async fn open(
        config: Config,
        extractor: Arc<dyn ConceptExtractor>,
        store: Arc<dyn NoteStore>,
    ) -> Result<Self, GraphError> {
        let graph = if config.graph_path.exists() {
            let graph = load_graph(&config.graph_path)?;
            tracing::info!(
                "Loaded graph from {} ({} nodes, {} edges, {} vertices)",
                config.graph_path.display(),
                graph.node_count(),
                graph.edge_count(),
                graph.vertex_count()
            );
            graph
        } else {
            let graph = KnowledgeGraph::new();
            save_graph(&config.graph_path, &graph)?;
            tracing::info!("Created empty graph at {}", config.graph_path.display());
            graph
        };

        Ok(Self {
            builder: GraphBuilder::new(config.scoring),
            config,
            extractor,
            store,
            graph,
        })
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn extractor(&self) -> &dyn ConceptExtractor {
        self.extractor.as_ref()
    }

    /// Ingest one note: extract, store, incorporate, save.
    ///
    /// A failed extraction leaves both the store and the graph untouched.
    /// If the concept upsert fails after the note was stored, the store keeps
    /// the note without concepts and the graph is not changed; the next
    /// [`rebuild`](Self::rebuild) re-extracts its concepts and adds it.
    pub async fn add_note(&mut self, text: &str) -> Result<AddedNote, GraphError> {
        let concepts = self
            .extractor
            .extract_concepts(text)
            .await
            .map_err(GraphError::extraction)?;

        let node_text = if self.config.extractor.summarize {
            self.extractor
                .summarize(text)
                .await
                .map_err(GraphError::extraction)?
        } else {
            text.to_string()
        };

        let note_id = self.store.add_note(text).await.map_err(GraphError::store)?;
        self.store
            .upsert_concepts(note_id, &concepts)
            .await
            .map_err(GraphError::store)?;

        let incorporated = self.builder.incorporate(&mut self.graph, node_text, concepts);
        save_graph(&self.config.graph_path, &self.graph)?;

        tracing::info!(
            note_id,
            node_id = incorporated.node_id,
            edges = incorporated.edges_added,
            vertices = incorporated.vertices_added,
            "Note added"
        );

        Ok(AddedNote {
            note_id,
            node_id: incorporated.node_id,
            edges_added: incorporated.edges_added,
            vertices_added: incorporated.vertices_added,
        })
    }

    /// Re-extract the concepts of every stored note.
    ///
    /// Only the bulk fetch can fail the call; a note whose extraction or
    /// upsert fails is logged and counted in `failed`.
    pub async fn update_all_concepts(&self) -> Result<ConceptUpdate, GraphError> {
        let notes = self
            .store
            .fetch_all_notes()
            .await
            .map_err(GraphError::store)?;

        let mut report = ConceptUpdate::default();
        for note in notes {
            let concepts = match self.extractor.extract_concepts(&note.text).await {
                Ok(concepts) => concepts,
                Err(e) => {
                    tracing::warn!("Concept extraction failed for note {}: {:#}", note.id, e);
                    report.failed += 1;
                    continue;
                }
            };
            if let Err(e) = self.store.upsert_concepts(note.id, &concepts).await {
                tracing::warn!("Failed to update concepts of note {}: {:#}", note.id, e);
                report.failed += 1;
                continue;
            }
            report.updated += 1;
        }

        tracing::info!(
            "Updated concepts for {} notes ({} failed)",
            report.updated,
            report.failed
        );
        Ok(report)
    }

    /// Refresh all concepts, then replace the graph with a full rebuild over
    /// the stored notes and save it.
    pub async fn rebuild(&mut self) -> Result<RebuildReport, GraphError> {
        let concepts = self.update_all_concepts().await?;

        let notes = self
            .store
            .fetch_all_notes()
            .await
            .map_err(GraphError::store)?;
        let inputs: Vec<NoteInput> = notes
            .into_iter()
            .map(|n| NoteInput {
                id: n.id,
                text: n.text,
                concepts: n.concepts,
            })
            .collect();

        self.graph = self.builder.rebuild(&inputs);
        save_graph(&self.config.graph_path, &self.graph)?;

        let report = RebuildReport {
            concepts,
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            vertices: self.graph.vertex_count(),
        };
        tracing::info!(
            "Rebuilt graph: {} nodes, {} edges, {} vertices",
            report.nodes,
            report.edges,
            report.vertices
        );
        Ok(report)
    }
}
