//! cortex-sync — the Index Engine: scans a node store and
//! rebuilds/persists the generated artifacts under `.activations/` (the
//! Graph index, the Vector index, and the LLM cache stubs), plus the
//! `cortex.json` configuration layer and cortex-root discovery that sit
//! above it.
//!
//! Nothing under `.activations/` is load-bearing source of truth: every
//! file there is derived from the node files under `neuronas/` and can be
//! deleted and regenerated by the next `sync`.

mod cache;
mod config;
mod engine;
mod root;

pub use cache::{Cache, CacheEntry};
pub use config::CortexConfig;
pub use engine::{sync, IndexStats};
pub use root::{activations_dir, find_cortex_root, node_dir};
