//! End-to-end exercise of the Index Engine's public API: write a handful of
//! node files to a throwaway tree, `sync` it, then reload every generated
//! artifact directly (the way the CLI adapter's `query`/`validate`
//! subcommands do) to confirm the whole pipeline is wired together.

use cortex_core::{Connection, ConnectionType};
use cortex_index::{VectorIndex, WordVectors};
use cortex_store::NodeStore;
use cortex_sync::{sync, CortexConfig};
use std::fs;

fn write_node(dir: &std::path::Path, id: &str, title: &str, body: &str) {
    let text = format!("---\nid: {id}\ntitle: {title}\n---\n{body}\n");
    fs::write(dir.join(format!("{id}.md")), text).unwrap();
}

#[test]
fn sync_rebuilds_every_artifact_and_a_second_pass_reuses_the_vector_index() {
    let store_dir = tempfile::tempdir().unwrap();
    let activations_dir = tempfile::tempdir().unwrap();
    write_node(store_dir.path(), "auth.flow", "Auth flow", "Login and session handling.");
    write_node(store_dir.path(), "billing.invoice", "Billing invoice", "Invoice generation.");

    let store = NodeStore::new(store_dir.path());
    let mut auth = store.read("auth.flow").unwrap();
    auth.add_connection(ConnectionType::RelatesTo, Connection::new("billing.invoice", 70));
    store.write(&auth, true).unwrap();

    let mut word_vectors = WordVectors::new(2);
    word_vectors.insert("login", vec![1.0, 0.0]);
    word_vectors.insert("invoice", vec![0.0, 1.0]);

    let config = CortexConfig {
        vector_dim: 2,
        ..CortexConfig::default()
    };

    let stats = sync(&store, activations_dir.path(), &word_vectors, &config, false).unwrap();
    assert_eq!(stats.node_count, 2);
    assert_eq!(stats.graph_nodes, 2);
    assert_eq!(stats.graph_edges, 1);
    assert_eq!(stats.vector_count, 2);
    assert_eq!(stats.orphans, 0);

    let graph = cortex_graph::load(&activations_dir.path().join("graph.idx")).unwrap();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);

    let (vectors, first_timestamp) =
        VectorIndex::load(&activations_dir.path().join("vectors.bin")).unwrap();
    assert_eq!(vectors.len(), 2);

    assert!(activations_dir.path().join("cache/summaries.cache").is_file());
    assert!(activations_dir.path().join("cache/tokens.cache").is_file());

    let second = sync(&store, activations_dir.path(), &word_vectors, &config, false).unwrap();
    assert_eq!(second.vector_count, 2);
    let (_, second_timestamp) =
        VectorIndex::load(&activations_dir.path().join("vectors.bin")).unwrap();
    assert_eq!(first_timestamp, second_timestamp, "unchanged tree must skip the rebuild");
}

#[test]
fn orphan_connection_targets_are_counted_without_failing_the_sync() {
    let store_dir = tempfile::tempdir().unwrap();
    let activations_dir = tempfile::tempdir().unwrap();
    write_node(store_dir.path(), "auth.flow", "Auth flow", "body");

    let store = NodeStore::new(store_dir.path());
    let mut node = store.read("auth.flow").unwrap();
    node.add_connection(ConnectionType::RelatesTo, Connection::new("does.not.exist", 40));
    store.write(&node, true).unwrap();

    let config = CortexConfig {
        vector_dim: 2,
        ..CortexConfig::default()
    };
    let stats = sync(&store, activations_dir.path(), &WordVectors::new(2), &config, false).unwrap();
    assert_eq!(stats.orphans, 1);
}
