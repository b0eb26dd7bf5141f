//! The Index Engine: the single `sync` entry point.
//!
//! `sync` is the only place that writes generated artifacts
//! (`.activations/graph.idx`, `.activations/vectors.bin`,
//! `.activations/cache/*.cache`); everything under `.activations/` is safe
//! to delete, since the next `sync` rebuilds it from the node files.

use crate::cache::Cache;
use crate::config::CortexConfig;
use cortex_core::Node;
use cortex_error::Result;
use cortex_graph::Graph;
use cortex_index::{EmbeddingProvider, VectorIndex, WordVectors};
use cortex_store::NodeStore;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Summary counters returned by [`sync`]. `Serialize` so
/// a CLI adapter can emit it as JSON without hand-rolled formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub node_count: usize,
    pub graph_nodes: usize,
    pub graph_edges: usize,
    pub vector_count: usize,
    pub cache_entries: usize,
    pub orphans: usize,
}

/// Runs a full sync pass: scan, rebuild+persist the Graph, refresh cache
/// stubs, conditionally rebuild the Vector Index, and report counters.
///
/// `word_vectors`'s dimension must match `config.vector_dim`; a mismatch
/// surfaces as [`cortex_error::Error::DimensionMismatch`] when the vector
/// index is rebuilt.
pub fn sync(
    node_store: &NodeStore,
    activations_dir: &Path,
    word_vectors: &WordVectors,
    config: &CortexConfig,
    force_rebuild: bool,
) -> Result<IndexStats> {
    let nodes = node_store.scan()?;
    tracing::info!(count = nodes.len(), "scanned node store");

    let graph = Graph::from_nodes(&nodes);
    let graph_path = activations_dir.join("graph.idx");
    cortex_graph::save(&graph, &graph_path)?;
    tracing::debug!(
        path = %graph_path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "persisted graph index"
    );

    let cache_dir = activations_dir.join("cache");
    let summaries = Cache::ensure_stub(&cache_dir.join("summaries.cache"));
    let tokens = Cache::ensure_stub(&cache_dir.join("tokens.cache"));
    let cache_entries = summaries.len() + tokens.len();

    let vector_count = rebuild_vector_index_if_stale(
        node_store,
        &nodes,
        &activations_dir.join("vectors.bin"),
        word_vectors,
        config,
        force_rebuild,
    )?;

    let orphans = count_orphans(&nodes);

    Ok(IndexStats {
        node_count: nodes.len(),
        graph_nodes: graph.node_count(),
        graph_edges: graph.edge_count(),
        vector_count,
        cache_entries,
        orphans,
    })
}

/// Step 4: rebuild the Vector Index when the source tree is newer than its
/// stored timestamp, or unconditionally when `force_rebuild` is set. A
/// missing or corrupt existing index (any load error) is treated the same
/// as "needs rebuild" rather than aborting the sync.
fn rebuild_vector_index_if_stale(
    node_store: &NodeStore,
    nodes: &[Node],
    vectors_path: &Path,
    word_vectors: &WordVectors,
    config: &CortexConfig,
    force_rebuild: bool,
) -> Result<usize> {
    let latest_mtime = node_store.latest_mtime()?;
    let existing = VectorIndex::load(vectors_path).ok();
    let stale = match &existing {
        Some((_, timestamp)) => latest_mtime > *timestamp,
        None => true,
    };

    if !force_rebuild && !stale {
        tracing::debug!("vector index up to date, skipping rebuild");
        return Ok(existing.map(|(idx, _)| idx.len()).unwrap_or(0));
    }

    let provider = EmbeddingProvider::new(word_vectors);
    let mut index = VectorIndex::new(config.vector_dim);
    for node in nodes {
        index.insert(&node.id, provider.embed_node(node))?;
    }
    index.save(vectors_path, latest_mtime)?;
    tracing::info!(count = index.len(), forced = force_rebuild, "rebuilt vector index");
    Ok(index.len())
}

/// A connection target id with no corresponding source node file is an
/// orphan: not an error, since target resolvability is
/// never enforced, just a count the caller can act on.
fn count_orphans(nodes: &[Node]) -> usize {
    let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    let mut orphan_targets: HashSet<&str> = HashSet::new();
    for node in nodes {
        for conns in node.connections.values() {
            for conn in conns {
                if !ids.contains(conn.target_id.as_str()) {
                    orphan_targets.insert(conn.target_id.as_str());
                }
            }
        }
    }
    orphan_targets.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortex_core::{Connection, ConnectionType};
    use std::fs;

    fn vectors() -> WordVectors {
        let mut t = WordVectors::new(2);
        t.insert("auth", vec![1.0, 0.0]);
        t.insert("login", vec![0.0, 1.0]);
        t
    }

    fn write_node(dir: &Path, id: &str, title: &str, body: &str) {
        let text = format!("---\nid: {id}\ntitle: {title}\n---\n{body}\n");
        fs::write(dir.join(format!("{id}.md")), text).unwrap();
    }

    #[test]
    fn sync_builds_graph_and_vector_artifacts_from_empty_store() {
        let store_dir = tempfile::tempdir().unwrap();
        let activations_dir = tempfile::tempdir().unwrap();
        let store = NodeStore::new(store_dir.path());
        let config = CortexConfig {
            vector_dim: 2,
            ..CortexConfig::default()
        };

        let stats = sync(&store, activations_dir.path(), &vectors(), &config, false).unwrap();
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.graph_nodes, 0);
        assert_eq!(stats.vector_count, 0);
        assert!(activations_dir.path().join("graph.idx").is_file());
        assert!(activations_dir.path().join("vectors.bin").is_file());
        assert!(activations_dir.path().join("cache/summaries.cache").is_file());
        assert!(activations_dir.path().join("cache/tokens.cache").is_file());
    }

    #[test]
    fn sync_counts_nodes_graph_edges_and_vectors() {
        let store_dir = tempfile::tempdir().unwrap();
        let activations_dir = tempfile::tempdir().unwrap();
        write_node(store_dir.path(), "auth", "Auth", "Login flow.");
        write_node(store_dir.path(), "login", "Login", "Uses auth.");

        let store = NodeStore::new(store_dir.path());
        let mut node = store.read("auth").unwrap();
        node.add_connection(ConnectionType::RelatesTo, Connection::new("login", 80));
        store.write(&node, true).unwrap();

        let config = CortexConfig {
            vector_dim: 2,
            ..CortexConfig::default()
        };
        let stats = sync(&store, activations_dir.path(), &vectors(), &config, false).unwrap();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.graph_nodes, 2);
        assert_eq!(stats.graph_edges, 1);
        assert_eq!(stats.vector_count, 2);
        assert_eq!(stats.orphans, 0);
    }

    #[test]
    fn sync_counts_orphan_connection_targets() {
        let store_dir = tempfile::tempdir().unwrap();
        let activations_dir = tempfile::tempdir().unwrap();
        write_node(store_dir.path(), "auth", "Auth", "body");

        let store = NodeStore::new(store_dir.path());
        let mut node = store.read("auth").unwrap();
        node.add_connection(ConnectionType::RelatesTo, Connection::new("missing.node", 50));
        store.write(&node, true).unwrap();

        let config = CortexConfig {
            vector_dim: 2,
            ..CortexConfig::default()
        };
        let stats = sync(&store, activations_dir.path(), &vectors(), &config, false).unwrap();
        assert_eq!(stats.orphans, 1);
    }

    #[test]
    fn second_sync_skips_vector_rebuild_when_not_stale() {
        let store_dir = tempfile::tempdir().unwrap();
        let activations_dir = tempfile::tempdir().unwrap();
        write_node(store_dir.path(), "a", "A", "body");

        let store = NodeStore::new(store_dir.path());
        let config = CortexConfig {
            vector_dim: 2,
            ..CortexConfig::default()
        };
        sync(&store, activations_dir.path(), &vectors(), &config, false).unwrap();
        let (_, first_timestamp) = VectorIndex::load(&activations_dir.path().join("vectors.bin")).unwrap();

        let stats = sync(&store, activations_dir.path(), &vectors(), &config, false).unwrap();
        let (_, second_timestamp) = VectorIndex::load(&activations_dir.path().join("vectors.bin")).unwrap();
        assert_eq!(stats.vector_count, 1);
        assert_eq!(first_timestamp, second_timestamp);
    }

    #[test]
    fn force_rebuild_always_rewrites_the_vector_index() {
        let store_dir = tempfile::tempdir().unwrap();
        let activations_dir = tempfile::tempdir().unwrap();
        write_node(store_dir.path(), "a", "A", "body");

        let store = NodeStore::new(store_dir.path());
        let config = CortexConfig {
            vector_dim: 2,
            ..CortexConfig::default()
        };
        sync(&store, activations_dir.path(), &vectors(), &config, false).unwrap();
        let stats = sync(&store, activations_dir.path(), &vectors(), &config, true).unwrap();
        assert_eq!(stats.vector_count, 1);
    }
}
