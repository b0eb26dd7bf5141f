//! End-to-end exercises against `cortex-query`'s public API only: build a
//! small in-memory collection plus its indices, then drive the query
//! engine, the validator, and the state machine the way a caller one layer
//! up (the Index Engine, or a CLI adapter) would.

use cortex_core::{Connection, ConnectionType, Node, NodeType};
use cortex_graph::Graph;
use cortex_index::{Bm25Index, EmbeddingProvider, VectorIndex, WordVectors};
use cortex_query::{
    is_legal, parse, serialize, validate_collection, validate_node, validate_transition,
    QueryConfig, QueryEngine,
};
use indexmap::IndexMap;

fn word_vectors() -> WordVectors {
    let mut wv = WordVectors::new(3);
    wv.insert("auth", vec![1.0, 0.0, 0.0]);
    wv.insert("login", vec![0.9, 0.1, 0.0]);
    wv.insert("billing", vec![0.0, 1.0, 0.0]);
    wv.insert("invoice", vec![0.0, 0.9, 0.1]);
    wv
}

fn sample_collection() -> (IndexMap<String, Node>, Vec<Node>) {
    let mut auth = Node::new("auth.flow", "auth login flow", NodeType::Concept);
    auth.tags = vec!["auth".into()];
    auth.body = "Describes the login flow.".to_string();
    auth.add_connection(ConnectionType::RelatesTo, Connection::new("billing.invoice", 60));

    let mut billing = Node::new("billing.invoice", "billing invoice generation", NodeType::Concept);
    billing.tags = vec!["billing".into()];
    billing.body = "Describes invoice generation.".to_string();

    let nodes = vec![auth, billing];
    let map: IndexMap<String, Node> = nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();
    (map, nodes)
}

#[test]
fn sync_then_query_pipeline_across_filter_text_vector_and_hybrid_modes() {
    let (nodes_by_id, nodes) = sample_collection();
    let graph = Graph::from_nodes(&nodes);

    let mut bm25 = Bm25Index::new();
    for node in &nodes {
        bm25.add_document(&node.id, &format!("{} {}", node.title, node.body));
    }
    bm25.build();

    let wv = word_vectors();
    let embedder = EmbeddingProvider::new(&wv);
    let mut vectors = VectorIndex::new(3);
    for node in &nodes {
        vectors.insert(&node.id, embedder.embed_node(node)).unwrap();
    }

    let engine = QueryEngine::new(&nodes_by_id, &graph, &bm25, &vectors, &embedder)
        .with_config(QueryConfig::default());

    let filtered = engine.filter("tag:auth", None).unwrap();
    assert_eq!(filtered, vec![("auth.flow".to_string(), 1.0)]);

    let text_hits = engine.text("login", None);
    assert!(text_hits.iter().any(|(id, _)| id == "auth.flow"));

    let vector_hits = engine.vector("auth", None).unwrap();
    assert_eq!(vector_hits[0].0, "auth.flow");

    let hybrid_hits = engine.hybrid("auth login", None).unwrap();
    assert!(!hybrid_hits.is_empty());

    let auto = engine.query("tag:auth", None).unwrap();
    assert_eq!(auto, filtered);

    let activation_hits = engine.activation("auth", None);
    assert!(activation_hits.iter().any(|(id, _)| id == "billing.invoice"));
}

#[test]
fn structured_query_round_trips_through_parse_and_serialize() {
    let original = "type:issue AND tag:auth AND link(relates_to, billing.invoice)";
    let expr = parse(original).unwrap();
    let round_tripped = serialize(&expr);
    let reparsed = parse(&round_tripped).unwrap();
    assert_eq!(expr, reparsed);
}

#[test]
fn collection_validation_catches_duplicate_ids_before_query_time() {
    let (_, mut nodes) = sample_collection();
    nodes.push(Node::new("auth.flow", "duplicate", NodeType::Concept));
    assert!(validate_collection(&nodes).is_err());

    let well_formed = Node::new("req.auth", "Auth requirement", NodeType::Requirement);
    assert!(validate_node(&well_formed).is_ok());
}

#[test]
fn issue_workflow_transitions_are_gated_by_the_state_machine() {
    assert!(is_legal(NodeType::Issue, "open", "in_progress"));
    assert!(!is_legal(NodeType::Issue, "open", "closed"));

    assert!(validate_transition(NodeType::Issue, "open", "in_progress", false).is_ok());
    assert!(validate_transition(NodeType::Issue, "open", "closed", false).is_err());
    assert!(validate_transition(NodeType::Issue, "open", "closed", true).is_ok());
}
