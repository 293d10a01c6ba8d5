//! Read-only insight queries over a [`KnowledgeGraph`].
//!
//! The knowledge graph is projected onto an undirected `petgraph` graph (one
//! petgraph edge per stored edge, direction dropped) for neighbourhood and
//! component queries. Nothing here mutates the knowledge graph.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

use super::models::KnowledgeGraph;
use super::similarity::concept_key;

// ============================================================================
// Projection
// ============================================================================

/// Undirected petgraph view of a knowledge graph.
///
/// Node weights are knowledge-graph node ids, edge weights are similarity
/// weights. Built in ascending id order.
pub struct SimilarityView {
    pub graph: UnGraph<i64, f64>,
    pub index_of: HashMap<i64, NodeIndex>,
}

impl SimilarityView {
    pub fn new(kg: &KnowledgeGraph) -> Self {
        let mut graph = UnGraph::with_capacity(kg.node_count(), kg.edge_count());
        let mut index_of = HashMap::with_capacity(kg.node_count());

        for node in kg.nodes() {
            index_of.insert(node.id, graph.add_node(node.id));
        }
        for edge in kg.edges() {
            if let (Some(&a), Some(&b)) = (index_of.get(&edge.source_id), index_of.get(&edge.target_id)) {
                graph.add_edge(a, b, edge.weight);
            }
        }

        Self { graph, index_of }
    }
}

// ============================================================================
// Related notes
// ============================================================================

/// A neighbour of a note, with its strongest connecting weight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedNote {
    pub node_id: i64,
    pub text: String,
    pub weight: f64,
    /// Concepts recorded on vertices between the two notes, deduplicated
    pub shared_concepts: Vec<String>,
}

/// Notes directly connected to `node_id`, strongest first.
///
/// Edges in both directions count; when a pair has several edges (full
/// rebuilds store both directions) the highest weight wins. Ties are broken by
/// ascending node id. Returns an empty list for an unknown node.
pub fn related_notes(kg: &KnowledgeGraph, node_id: i64, limit: usize) -> Vec<RelatedNote> {
    let view = SimilarityView::new(kg);
    let Some(&start) = view.index_of.get(&node_id) else {
        return Vec::new();
    };

    let mut best: BTreeMap<i64, f64> = BTreeMap::new();
    for edge in view.graph.edges(start) {
        let other = if edge.source() == start {
            edge.target()
        } else {
            edge.source()
        };
        let other_id = view.graph[other];
        let weight = *edge.weight();
        best.entry(other_id)
            .and_modify(|w| *w = w.max(weight))
            .or_insert(weight);
    }

    let mut related: Vec<RelatedNote> = best
        .into_iter()
        .map(|(other_id, weight)| RelatedNote {
            node_id: other_id,
            text: kg.node(other_id).map(|n| n.text.clone()).unwrap_or_default(),
            weight,
            shared_concepts: shared_concepts(kg, node_id, other_id),
        })
        .collect();

    related.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.node_id.cmp(&b.node_id))
    });
    related.truncate(limit);
    related
}

/// Concepts on vertices linking `a` and `b` (either direction), first-seen
/// spelling, case-insensitive dedup.
fn shared_concepts(kg: &KnowledgeGraph, a: i64, b: i64) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    kg.vertices()
        .filter(|v| (v.node_id == a && v.target_id == b) || (v.node_id == b && v.target_id == a))
        .filter(|v| seen.insert(concept_key(&v.concept)))
        .map(|v| v.concept.clone())
        .collect()
}

// ============================================================================
// Clusters (connected components)
// ============================================================================

/// Connected components of the similarity graph.
///
/// Each cluster lists node ids ascending; clusters are ordered by their
/// smallest id. Isolated notes form singleton clusters.
pub fn concept_clusters(kg: &KnowledgeGraph) -> Vec<Vec<i64>> {
    let view = SimilarityView::new(kg);
    let g = &view.graph;
    let mut visited = vec![false; g.node_count()];
    let mut clusters = Vec::new();

    for start in g.node_indices() {
        if visited[start.index()] {
            continue;
        }
        visited[start.index()] = true;
        let mut members = Vec::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            members.push(g[current]);
            for neighbor in g.neighbors(current) {
                if !visited[neighbor.index()] {
                    visited[neighbor.index()] = true;
                    queue.push_back(neighbor);
                }
            }
        }

        members.sort_unstable();
        clusters.push(members);
    }

    clusters
}

// ============================================================================
// Stats & concept ranking
// ============================================================================

/// Summary numbers for a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub vertex_count: usize,
    /// Distinct concepts, case-insensitive
    pub concept_count: usize,
    /// Nodes with no edge in either direction
    pub isolated_nodes: usize,
    /// Mean edge weight (0.0 without edges)
    pub mean_weight: f64,
}

pub fn graph_stats(kg: &KnowledgeGraph) -> GraphStats {
    let view = SimilarityView::new(kg);
    let isolated_nodes = view
        .graph
        .node_indices()
        .filter(|&idx| view.graph.neighbors(idx).next().is_none())
        .count();

    let concept_count = kg
        .nodes()
        .flat_map(|n| n.concepts.iter().map(|c| concept_key(c)))
        .collect::<std::collections::HashSet<_>>()
        .len();

    let mean_weight = if kg.edge_count() == 0 {
        0.0
    } else {
        kg.edges().map(|e| e.weight).sum::<f64>() / kg.edge_count() as f64
    };

    GraphStats {
        node_count: kg.node_count(),
        edge_count: kg.edge_count(),
        vertex_count: kg.vertex_count(),
        concept_count,
        isolated_nodes,
        mean_weight,
    }
}

/// A concept and how many notes carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConceptFrequency {
    pub concept: String,
    pub notes: usize,
}

/// Concepts ranked by the number of notes that carry them.
///
/// Counted once per note, case-insensitively; the spelling shown is the first
/// one met in id order. Ties keep first-seen order.
pub fn top_concepts(kg: &KnowledgeGraph, limit: usize) -> Vec<ConceptFrequency> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, (String, usize)> = HashMap::new();

    for node in kg.nodes() {
        let mut in_node = std::collections::HashSet::new();
        for concept in &node.concepts {
            let key = concept_key(concept);
            if !in_node.insert(key.clone()) {
                continue;
            }
            let entry = counts.entry(key.clone()).or_insert_with(|| {
                order.push(key);
                (concept.clone(), 0)
            });
            entry.1 += 1;
        }
    }

    let mut ranked: Vec<ConceptFrequency> = order
        .iter()
        .filter_map(|key| counts.get(key))
        .map(|(concept, notes)| ConceptFrequency {
            concept: concept.clone(),
            notes: *notes,
        })
        .collect();
    // Stable sort keeps first-seen order among ties
    ranked.sort_by(|a, b| b.notes.cmp(&a.notes));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::{GraphBuilder, NoteInput};

    fn concepts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// 1: [rust, graphs]  2: [rust]  3: [graphs, petgraph]  4: [cooking]
    fn sample() -> KnowledgeGraph {
        let builder = GraphBuilder::default();
        let mut g = KnowledgeGraph::new();
        builder.incorporate(&mut g, "one", concepts(&["rust", "graphs"]));
        builder.incorporate(&mut g, "two", concepts(&["Rust"]));
        builder.incorporate(&mut g, "three", concepts(&["graphs", "petgraph"]));
        builder.incorporate(&mut g, "four", concepts(&["cooking"]));
        g
    }

    #[test]
    fn test_related_notes_both_directions() {
        let g = sample();

        // Node 1 is a target of edges from 2 (w=1/2) and 3 (w=1/3)
        let related = related_notes(&g, 1, 10);
        let ids: Vec<i64> = related.iter().map(|r| r.node_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!((related[0].weight - 0.5).abs() < 1e-12);
        assert_eq!(related[0].shared_concepts, vec!["Rust"]);
        assert_eq!(related[1].shared_concepts, vec!["graphs"]);

        // Node 2 is a source
        let related = related_notes(&g, 2, 10);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].node_id, 1);
        assert_eq!(related[0].text, "one");
    }

    #[test]
    fn test_related_notes_limit_and_unknown() {
        let g = sample();
        assert_eq!(related_notes(&g, 1, 1).len(), 1);
        assert!(related_notes(&g, 99, 10).is_empty());
        assert!(related_notes(&g, 4, 10).is_empty());
    }

    #[test]
    fn test_related_notes_collapses_rebuild_duplicates() {
        let notes = vec![
            NoteInput {
                id: 1,
                text: "a".into(),
                concepts: concepts(&["x"]),
            },
            NoteInput {
                id: 2,
                text: "b".into(),
                concepts: concepts(&["x"]),
            },
        ];
        let g = GraphBuilder::default().rebuild(&notes);
        assert_eq!(g.edge_count(), 2);
        let related = related_notes(&g, 1, 10);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].shared_concepts, vec!["x"]);
    }

    #[test]
    fn test_concept_clusters() {
        let g = sample();
        assert_eq!(concept_clusters(&g), vec![vec![1, 2, 3], vec![4]]);
        assert!(concept_clusters(&KnowledgeGraph::new()).is_empty());
    }

    #[test]
    fn test_graph_stats() {
        let g = sample();
        let stats = graph_stats(&g);
        assert_eq!(stats.node_count, 4);
        assert_eq!(stats.edge_count, 2);
        assert_eq!(stats.vertex_count, 2);
        assert_eq!(stats.concept_count, 4);
        assert_eq!(stats.isolated_nodes, 1);
        assert!((stats.mean_weight - (0.5 + 1.0 / 3.0) / 2.0).abs() < 1e-12);

        let empty = graph_stats(&KnowledgeGraph::new());
        assert_eq!(empty.mean_weight, 0.0);
    }

    #[test]
    fn test_top_concepts() {
        let g = sample();
        let top = top_concepts(&g, 2);
        assert_eq!(
            top,
            vec![
                ConceptFrequency {
                    concept: "rust".into(),
                    notes: 2
                },
                ConceptFrequency {
                    concept: "graphs".into(),
                    notes: 2
                },
            ]
        );
    }
}
