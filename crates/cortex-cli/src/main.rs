//! `cortex` — a thin command-line adapter over the cortex engine library
//! crates.
//!
//! This binary owns argument parsing and human-readable output only; every
//! behavior it exposes (sync, query, transition, validate) is implemented
//! in the library crates below it.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use cortex_core::NodeType;
use cortex_graph::Graph;
use cortex_index::{Bm25Index, EmbeddingProvider, VectorIndex, WordVectors};
use cortex_query::{validate_transition, QueryConfig, QueryEngine};
use cortex_store::NodeStore;
use cortex_sync::{activations_dir, find_cortex_root, node_dir, sync, CortexConfig};
use indexmap::IndexMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cortex", version, about = "File-backed knowledge graph engine")]
struct Cli {
    /// Cortex root directory. Defaults to searching the current directory
    /// and its ancestors for `cortex.json`.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the node store and rebuild the generated artifacts.
    Sync {
        /// Rebuild the vector index even if the source tree isn't newer.
        #[arg(long)]
        force: bool,
    },
    /// Run a query against the current indices.
    Query {
        /// filter | text | vector | hybrid | activation | auto (default: auto-detect)
        #[arg(long, default_value = "auto")]
        mode: String,
        /// Maximum number of results.
        #[arg(long)]
        limit: Option<usize>,
        query: String,
    },
    /// Validate the collection's structural invariants.
    Validate,
    /// Attempt a workflow status transition on one node.
    Transition {
        id: String,
        to: String,
        /// Bypass the state machine's legality check.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let root = resolve_root(cli.root.as_deref())?;
    let store = NodeStore::new(node_dir(&root));

    match cli.command {
        Commands::Sync { force } => run_sync(&store, &root, force),
        Commands::Query { mode, limit, query } => run_query(&store, &root, &mode, limit, &query),
        Commands::Validate => run_validate(&store),
        Commands::Transition { id, to, force } => run_transition(&store, &id, &to, force),
    }
}

fn resolve_root(explicit: Option<&std::path::Path>) -> Result<PathBuf> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    let cwd = std::env::current_dir().context("reading current directory")?;
    find_cortex_root(&cwd).ok_or_else(|| {
        anyhow!("no cortex.json found in {} or any ancestor", cwd.display())
    })
}

fn load_config(root: &std::path::Path) -> CortexConfig {
    let path = root.join("cortex.json");
    CortexConfig::from_file(&path).unwrap_or_default()
}

fn run_sync(store: &NodeStore, root: &std::path::Path, force: bool) -> Result<()> {
    let config = load_config(root);
    let word_vectors = WordVectors::new(config.vector_dim);
    let stats = sync(store, &activations_dir(root), &word_vectors, &config, force)?;
    println!(
        "nodes={} graph_nodes={} graph_edges={} vectors={} cache_entries={} orphans={}",
        stats.node_count,
        stats.graph_nodes,
        stats.graph_edges,
        stats.vector_count,
        stats.cache_entries,
        stats.orphans
    );
    Ok(())
}

fn run_query(
    store: &NodeStore,
    root: &std::path::Path,
    mode: &str,
    limit: Option<usize>,
    query: &str,
) -> Result<()> {
    let config = load_config(root);
    let nodes = store.scan()?;

    let graph = cortex_graph::load(&activations_dir(root).join("graph.idx"))
        .unwrap_or_else(|_| Graph::from_nodes(&nodes));

    let mut bm25 = Bm25Index::with_params(config.bm25_k1, config.bm25_b);
    for node in &nodes {
        bm25.add_document(&node.id, &format!("{} {}", node.title, node.body));
    }
    bm25.build();

    let word_vectors = WordVectors::new(config.vector_dim);
    let (vectors, _) = VectorIndex::load(&activations_dir(root).join("vectors.bin"))
        .unwrap_or_else(|_| (VectorIndex::new(config.vector_dim), 0));
    let embedder = EmbeddingProvider::new(&word_vectors);

    let node_map: IndexMap<String, cortex_core::Node> =
        nodes.iter().map(|n| (n.id.clone(), n.clone())).collect();

    let engine_config = QueryConfig {
        hybrid_text_weight: 0.6,
        hybrid_vector_weight: 0.4,
        activation_depth: config.activation_depth,
        activation_decay: config.activation_decay,
    };
    let engine = QueryEngine::new(&node_map, &graph, &bm25, &vectors, &embedder)
        .with_config(engine_config);

    let results = match mode {
        "auto" => engine.query(query, limit)?,
        "filter" => engine.filter(query, limit)?,
        "text" => engine.text(query, limit),
        "vector" => engine.vector(query, limit)?,
        "hybrid" => engine.hybrid(query, limit)?,
        "activation" => engine.activation(query, limit),
        other => return Err(anyhow!("unknown query mode `{other}`")),
    };

    for (id, score) in results {
        println!("{score:.4}\t{id}");
    }
    Ok(())
}

fn run_validate(store: &NodeStore) -> Result<()> {
    let nodes = store.scan()?;
    cortex_query::validate_collection(&nodes)?;
    for node in &nodes {
        cortex_query::validate_node(node)?;
    }
    println!("{} nodes validated, no invariant violations", nodes.len());
    Ok(())
}

fn run_transition(store: &NodeStore, id: &str, to: &str, force: bool) -> Result<()> {
    let mut node = store.read(id)?;
    let from = node
        .status()
        .ok_or_else(|| anyhow!("node `{id}` has no status field to transition"))?;
    let node_type = NodeType::parse_lenient(node_type_str(&node));
    validate_transition(node_type, &from, to, force)?;
    set_status(&mut node, to);
    node.updated = Some(chrono::Utc::now().to_rfc3339());
    store.write(&node, false)?;
    println!("{id}: {from} -> {to}");
    Ok(())
}

fn node_type_str(node: &cortex_core::Node) -> &str {
    node.node_type.as_str()
}

fn set_status(node: &mut cortex_core::Node, to: &str) {
    use cortex_core::NodeContext;
    match &mut node.context {
        Some(NodeContext::Issue { status, .. }) => *status = to.parse().unwrap_or(*status),
        Some(NodeContext::TestCase { status, .. }) => *status = to.parse().unwrap_or(*status),
        Some(NodeContext::Requirement { status, .. }) => *status = to.parse().unwrap_or(*status),
        _ => {}
    }
}
