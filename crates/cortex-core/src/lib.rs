//! cortex-core — the node data model shared by every other crate in the
//! cortex engine workspace.
//!
//! This crate owns only *types*: the [`Node`] struct, its [`NodeType`] tag,
//! [`ConnectionType`]/[`Connection`], and the type-dependent [`NodeContext`]
//! variants. Parsing node files, building the graph, and indexing are all
//! handled by crates above this one.

mod connection;
mod context;
mod node;

pub use connection::{Connection, ConnectionType, UnknownConnectionType};
pub use context::{IssueStatus, LlmMetadata, NodeContext, RequirementStatus, TestCaseStatus};
pub use node::{initial_status, Node, NodeType};
