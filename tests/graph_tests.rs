//! Graph engine tests through the public API
//!
//! These tests don't require external services.
//! Run with: cargo test --test graph_tests

use notegraph::graph::{
    load_graph, parse_graph, save_graph, to_text, GraphBuilder, KnowledgeGraph, NoteInput,
    ScoringStrategy,
};
use notegraph::GraphError;

fn concepts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const EPS: f64 = 1e-9;

#[test]
fn test_self_similarity_is_one() {
    let a = concepts(&["rust", "graphs", "notes"]);
    assert!((ScoringStrategy::Jaccard.score(&a, &a) - 1.0).abs() < EPS);
    assert!((ScoringStrategy::PairwiseMatch.score(&a, &a) - 1.0).abs() < EPS);
}

#[test]
fn test_empty_lists_score_zero() {
    let empty: Vec<String> = Vec::new();
    let x = concepts(&["x"]);
    for strategy in [ScoringStrategy::Jaccard, ScoringStrategy::PairwiseMatch] {
        assert_eq!(strategy.score(&empty, &empty), 0.0);
        assert_eq!(strategy.score(&empty, &x), 0.0);
    }
}

#[test]
fn test_one_shared_of_three() {
    let a = concepts(&["a", "b"]);
    let b = concepts(&["b", "c"]);
    assert!((ScoringStrategy::Jaccard.score(&a, &b) - 1.0 / 3.0).abs() < EPS);
    assert!((ScoringStrategy::PairwiseMatch.score(&a, &b) - 1.0 / 3.0).abs() < EPS);
}

#[test]
fn test_two_overlapping_notes_make_one_edge_and_vertex() {
    let builder = GraphBuilder::default();
    let mut graph = KnowledgeGraph::new();
    builder.incorporate(&mut graph, "first", concepts(&["x", "y"]));
    builder.incorporate(&mut graph, "second", concepts(&["y", "z"]));

    assert_eq!(graph.edge_count(), 1);
    assert_eq!(graph.vertex_count(), 1);
    let edge = graph.edges().next().unwrap();
    assert!((edge.weight - 1.0 / 3.0).abs() < EPS);
    assert_eq!(graph.vertices().next().unwrap().concept, "y");

    let third = builder.incorporate(&mut graph, "third", concepts(&["q"]));
    assert_eq!(graph.node_count(), 3);
    assert_eq!((third.edges_added, third.vertices_added), (0, 0));
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_ids_strictly_increase() {
    let builder = GraphBuilder::default();
    let mut graph = KnowledgeGraph::new();
    let ids: Vec<i64> = ["a b", "b c", "c d"]
        .iter()
        .map(|text| {
            let words: Vec<String> = text.split(' ').map(str::to_string).collect();
            builder.incorporate(&mut graph, *text, words).node_id
        })
        .collect();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_independent_graphs_do_not_share_counters() {
    let mut one = KnowledgeGraph::new();
    let mut two = KnowledgeGraph::new();
    let a = one.create_node("a", Vec::new());
    one.create_node("b", Vec::new());
    let c = two.create_node("c", Vec::new());
    assert_eq!(a, c);
}

#[test]
fn test_round_trip_through_file() {
    let builder = GraphBuilder::new(ScoringStrategy::PairwiseMatch);
    let mut graph = KnowledgeGraph::new();
    builder.incorporate(&mut graph, "Coffee and sleep", concepts(&["coffee", "sleep"]));
    builder.incorporate(&mut graph, "Sleep hygiene\nnotes", concepts(&["Sleep", "habits"]));
    builder.incorporate(&mut graph, "Coffee habits", concepts(&["coffee", "habits"]));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("knowledge_graph.txt");
    save_graph(&path, &graph).unwrap();
    let loaded = load_graph(&path).unwrap();

    let texts = |g: &KnowledgeGraph| g.nodes().map(|n| (n.id, n.text.clone())).collect::<Vec<_>>();
    assert_eq!(texts(&loaded), texts(&graph));
    assert_eq!(loaded.edge_count(), graph.edge_count());
    for (a, b) in loaded.edges().zip(graph.edges()) {
        assert_eq!((a.id, a.source_id, a.target_id), (b.id, b.source_id, b.target_id));
        assert!((a.weight - b.weight).abs() < 1e-6);
    }
    assert_eq!(
        loaded.nodes().map(|n| n.concepts.clone()).collect::<Vec<_>>(),
        graph.nodes().map(|n| n.concepts.clone()).collect::<Vec<_>>()
    );
    assert_eq!(to_text(&loaded), to_text(&graph));
}

#[test]
fn test_non_numeric_weight_fails_whole_load() {
    let text = "Concepts: x\n\
                Node 1: one\n\
                Node 2: two\n\
                Edge 5: SourceID=1, TargetID=2, Weight=abc\n";
    match parse_graph(text) {
        Err(GraphError::Parse { line, .. }) => assert_eq!(line, 4),
        other => panic!("expected parse error, got {:?}", other.map(|g| g.node_count())),
    }
}

#[test]
fn test_rebuild_relates_both_directions() {
    let notes = vec![
        NoteInput {
            id: 10,
            text: "a".into(),
            concepts: concepts(&["k", "m"]),
        },
        NoteInput {
            id: 20,
            text: "b".into(),
            concepts: concepts(&["K"]),
        },
    ];
    let graph = GraphBuilder::default().rebuild(&notes);

    let pairs: Vec<(i64, i64)> = graph.edges().map(|e| (e.source_id, e.target_id)).collect();
    assert_eq!(pairs, vec![(10, 20), (20, 10)]);
    assert!(graph.edges().all(|e| (e.weight - 0.5).abs() < EPS));

    // New nodes continue after the largest store id
    let mut graph = graph;
    let next = graph.create_node("later", Vec::new());
    assert!(next > 20);
}
