//! Knowledge graph data model.
//!
//! Defines the entities of the concept graph and the aggregate that owns them:
//!
//! - [`Node`]: one ingested note
//! - [`Edge`]: a weighted similarity relationship between two notes
//! - [`Vertex`]: one shared concept recorded alongside an edge
//! - [`KnowledgeGraph`]: id-ordered maps of all three, plus the id counters
//!
//! All maps are `BTreeMap`s keyed by id, so every enumeration is in ascending
//! id order. Counters live on the graph instance, so independent graphs never
//! share id sequences.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// Entities
// ============================================================================

/// A note incorporated into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique, monotonically assigned id (never reused)
    pub id: i64,
    /// Raw or summarized note content (may be empty)
    pub text: String,
    /// Concepts in extractor order; duplicates are kept as-is
    pub concepts: Vec<String>,
}

/// A similarity relationship between two distinct nodes.
///
/// Stored once, from the node that was being incorporated (`source_id`)
/// towards the pre-existing node (`target_id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: i64,
    pub source_id: i64,
    pub target_id: i64,
    /// Similarity weight in (0, 1]
    pub weight: f64,
}

/// A single concept shared by the two endpoints of an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: i64,
    pub node_id: i64,
    pub target_id: i64,
    /// Spelling taken from `node_id`'s concept list
    pub concept: String,
}

// ============================================================================
// Id allocation
// ============================================================================

/// Monotonic id counter for one entity kind.
///
/// Holds the last id handed out (0 when none). `next` never returns a value
/// it returned before, and `observe` only ever moves the counter forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdCounter {
    last: i64,
}

impl IdCounter {
    /// Allocate the next id (the first id is 1).
    pub fn next(&mut self) -> i64 {
        self.last += 1;
        self.last
    }

    /// Make sure future ids are strictly greater than `id`.
    pub fn observe(&mut self, id: i64) {
        if id > self.last {
            self.last = id;
        }
    }

    /// Last id allocated or observed.
    pub fn last(&self) -> i64 {
        self.last
    }
}

// ============================================================================
// KnowledgeGraph aggregate
// ============================================================================

/// In-memory concept graph.
///
/// Single-writer: mutation needs `&mut self`, there is no internal locking.
/// There is no deletion API; a graph only grows during a session.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<i64, Node>,
    edges: BTreeMap<i64, Edge>,
    vertices: BTreeMap<i64, Vertex>,
    node_ids: IdCounter,
    edge_ids: IdCounter,
    vertex_ids: IdCounter,
}

impl KnowledgeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Creation (fresh ids)
    // ------------------------------------------------------------------------

    /// Create a node with a freshly allocated id. Returns the id.
    pub fn create_node(&mut self, text: impl Into<String>, concepts: Vec<String>) -> i64 {
        let id = self.node_ids.next();
        self.nodes.insert(
            id,
            Node {
                id,
                text: text.into(),
                concepts,
            },
        );
        id
    }

    /// Create an edge with a freshly allocated id. Returns the id.
    ///
    /// Callers guarantee that both endpoints exist and differ.
    pub fn create_edge(&mut self, source_id: i64, target_id: i64, weight: f64) -> i64 {
        debug_assert_ne!(source_id, target_id);
        let id = self.edge_ids.next();
        self.edges.insert(
            id,
            Edge {
                id,
                source_id,
                target_id,
                weight,
            },
        );
        id
    }

    /// Create a vertex with a freshly allocated id. Returns the id.
    pub fn create_vertex(&mut self, node_id: i64, target_id: i64, concept: impl Into<String>) -> i64 {
        let id = self.vertex_ids.next();
        self.vertices.insert(
            id,
            Vertex {
                id,
                node_id,
                target_id,
                concept: concept.into(),
            },
        );
        id
    }

    // ------------------------------------------------------------------------
    // Insertion (caller-provided ids: loading, rebuilding from the store)
    // ------------------------------------------------------------------------

    /// Insert a node keeping its id. The node counter is advanced past it.
    ///
    /// Returns the node previously stored under that id, if any.
    pub fn insert_node(&mut self, node: Node) -> Option<Node> {
        self.node_ids.observe(node.id);
        self.nodes.insert(node.id, node)
    }

    /// Insert an edge keeping its id. The edge counter is advanced past it.
    pub fn insert_edge(&mut self, edge: Edge) -> Option<Edge> {
        self.edge_ids.observe(edge.id);
        self.edges.insert(edge.id, edge)
    }

    /// Insert a vertex keeping its id. The vertex counter is advanced past it.
    pub fn insert_vertex(&mut self, vertex: Vertex) -> Option<Vertex> {
        self.vertex_ids.observe(vertex.id);
        self.vertices.insert(vertex.id, vertex)
    }

    /// Replace the concept list of an existing node.
    ///
    /// Existing edges and vertices are left untouched. Returns false when the
    /// node does not exist.
    pub fn set_node_concepts(&mut self, node_id: i64, concepts: Vec<String>) -> bool {
        match self.nodes.get_mut(&node_id) {
            Some(node) => {
                node.concepts = concepts;
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Reads (ascending id order)
    // ------------------------------------------------------------------------

    pub fn node(&self, id: i64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: i64) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn vertex(&self, id: i64) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    pub fn contains_node(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deduplicated union of every node's concepts, first-seen order.
    ///
    /// Deduplication is exact (case-sensitive): this is the summary written on
    /// the first line of the graph file.
    pub fn all_concepts(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut concepts = Vec::new();
        for node in self.nodes.values() {
            for concept in &node.concepts {
                if seen.insert(concept.as_str()) {
                    concepts.push(concept.clone());
                }
            }
        }
        concepts
    }

    /// Last ids handed out or observed, as (node, edge, vertex).
    pub fn last_ids(&self) -> (i64, i64, i64) {
        (
            self.node_ids.last(),
            self.edge_ids.last(),
            self.vertex_ids.last(),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ids_strictly_increasing() {
        let mut g = KnowledgeGraph::new();
        let a = g.create_node("a", vec![]);
        let b = g.create_node("b", vec![]);
        let c = g.create_node("c", vec![]);
        assert_eq!(a, 1);
        assert!(a < b && b < c);
    }

    #[test]
    fn test_counters_are_per_kind() {
        let mut g = KnowledgeGraph::new();
        let n1 = g.create_node("a", vec![]);
        let n2 = g.create_node("b", vec![]);
        let e1 = g.create_edge(n2, n1, 0.5);
        let v1 = g.create_vertex(n2, n1, "x");
        let n3 = g.create_node("c", vec![]);
        let e2 = g.create_edge(n3, n1, 0.25);

        assert_eq!((n1, n2, n3), (1, 2, 3));
        assert_eq!((e1, e2), (1, 2));
        assert_eq!(v1, 1);
    }

    #[test]
    fn test_independent_graphs_do_not_share_counters() {
        let mut g1 = KnowledgeGraph::new();
        let mut g2 = KnowledgeGraph::new();
        g1.create_node("a", vec![]);
        g1.create_node("b", vec![]);
        assert_eq!(g2.create_node("c", vec![]), 1);
    }

    #[test]
    fn test_insert_advances_counter() {
        let mut g = KnowledgeGraph::new();
        g.insert_node(Node {
            id: 40,
            text: "loaded".into(),
            concepts: vec![],
        });
        assert_eq!(g.create_node("fresh", vec![]), 41);

        // Lower ids never pull the counter back
        g.insert_node(Node {
            id: 3,
            text: "older".into(),
            concepts: vec![],
        });
        assert_eq!(g.create_node("fresher", vec![]), 42);
    }

    #[test]
    fn test_enumeration_in_id_order() {
        let mut g = KnowledgeGraph::new();
        for id in [5, 1, 3] {
            g.insert_node(Node {
                id,
                text: format!("n{id}"),
                concepts: vec![],
            });
        }
        let ids: Vec<i64> = g.nodes().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }

    #[test]
    fn test_all_concepts_dedup_first_seen() {
        let mut g = KnowledgeGraph::new();
        g.create_node("a", vec!["rust".into(), "graphs".into()]);
        g.create_node("b", vec!["graphs".into(), "Rust".into(), "rust".into()]);
        assert_eq!(g.all_concepts(), vec!["rust", "graphs", "Rust"]);
    }

    #[test]
    fn test_set_node_concepts() {
        let mut g = KnowledgeGraph::new();
        let id = g.create_node("a", vec![]);
        assert!(g.set_node_concepts(id, vec!["x".into()]));
        assert_eq!(g.node(id).unwrap().concepts, vec!["x"]);
        assert!(!g.set_node_concepts(99, vec![]));
    }
}
