//! Graph construction.
//!
//! Two entry points share the same edge/vertex rule:
//!
//! - [`GraphBuilder::incorporate`] adds one note and relates it to every node
//!   already in the graph. Pairs of pre-existing nodes are never revisited.
//! - [`GraphBuilder::rebuild`] builds a fresh graph from a full note set and
//!   visits every ordered pair `(i, j)`, `i != j`, so each related pair gets
//!   two edges, one per direction.
//!
//! For a pair `(source, target)`: an edge is created when the score is > 0,
//! and for every concept of `source` that also appears (case-insensitively)
//! in `target`, a vertex carrying `source`'s spelling is created.

use super::models::{KnowledgeGraph, Node};
use super::similarity::{concept_key, ScoringStrategy};
use std::collections::HashSet;

/// A note handed to [`GraphBuilder::rebuild`].
#[derive(Debug, Clone, PartialEq)]
pub struct NoteInput {
    /// Node id to use (the note store's id)
    pub id: i64,
    pub text: String,
    pub concepts: Vec<String>,
}

/// What one `incorporate` call added to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Incorporated {
    pub node_id: i64,
    pub edges_added: usize,
    pub vertices_added: usize,
}

/// Derives edges and vertices from concept overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphBuilder {
    strategy: ScoringStrategy,
}

impl GraphBuilder {
    pub fn new(strategy: ScoringStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ScoringStrategy {
        self.strategy
    }

    /// Add a note to the graph and relate it to every existing node.
    ///
    /// Existing nodes are visited in ascending id order, so edge and vertex ids
    /// are deterministic. The new node is always the edge source.
    pub fn incorporate(
        &self,
        graph: &mut KnowledgeGraph,
        text: impl Into<String>,
        concepts: Vec<String>,
    ) -> Incorporated {
        let targets: Vec<Node> = graph.nodes().cloned().collect();
        let text = text.into();
        let node_id = graph.create_node(text.clone(), concepts.clone());
        let source = Node {
            id: node_id,
            text,
            concepts,
        };
        let (edges_added, vertices_added) = self.relate_all(graph, &source, &targets);

        tracing::debug!(
            "Incorporated node {}: {} edges, {} vertices",
            node_id,
            edges_added,
            vertices_added
        );

        Incorporated {
            node_id,
            edges_added,
            vertices_added,
        }
    }

    /// Build a fresh graph from a complete note set.
    ///
    /// Nodes keep the ids of their notes (the node counter ends at the largest
    /// one). Every ordered pair is related, producing duplicate edges for
    /// `(i, j)` and `(j, i)`. Later notes with an id already seen replace the
    /// earlier one.
    pub fn rebuild(&self, notes: &[NoteInput]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        for note in notes {
            graph.insert_node(Node {
                id: note.id,
                text: note.text.clone(),
                concepts: note.concepts.clone(),
            });
        }

        let all: Vec<Node> = graph.nodes().cloned().collect();
        for source in &all {
            let targets: Vec<Node> = all.iter().filter(|n| n.id != source.id).cloned().collect();
            self.relate_all(&mut graph, source, &targets);
        }

        tracing::debug!(
            "Rebuilt graph: {} nodes, {} edges, {} vertices",
            graph.node_count(),
            graph.edge_count(),
            graph.vertex_count()
        );

        graph
    }

    /// Apply the edge/vertex rule from `source` to each target, in order.
    fn relate_all(
        &self,
        graph: &mut KnowledgeGraph,
        source: &Node,
        targets: &[Node],
    ) -> (usize, usize) {
        let mut edges = 0;
        let mut vertices = 0;

        for target in targets {
            let weight = self.strategy.score(&source.concepts, &target.concepts);
            if weight <= 0.0 {
                continue;
            }

            graph.create_edge(source.id, target.id, weight);
            edges += 1;

            let target_keys: HashSet<String> =
                target.concepts.iter().map(|c| concept_key(c)).collect();
            for concept in &source.concepts {
                if target_keys.contains(&concept_key(concept)) {
                    graph.create_vertex(source.id, target.id, concept.clone());
                    vertices += 1;
                }
            }
        }

        (edges, vertices)
    }
}
