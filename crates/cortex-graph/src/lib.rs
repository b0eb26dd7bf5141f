//! cortex-graph — the in-memory bidirectional adjacency [`Graph`] derived
//! from a node collection's connections, and its checksum-gated binary
//! persistence format.

mod adjacency;
mod codec;

pub use adjacency::Graph;
pub use codec::{load, save};
