//! Structural invariants that span more than a single node file.
//!
//! Per-file invariants — well-formed front-matter, a `connections:`-free
//! body — are already enforced by `cortex-store` while parsing. This module
//! covers the invariants that only make sense once you have the whole
//! collection in hand (unique ids) or that matter when a caller builds a
//! [`Node`] in memory and wants to validate it *before* handing it to the
//! store for a write (body/priority checks a parser would otherwise catch
//! only on the next read-back).

use cortex_core::Node;
use cortex_error::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Checks a body for a `connections:` line at column zero, the same rule `cortex-store::parse` enforces while reading a
/// file from disk. Exposed here too so a caller constructing a `Node` body
/// in memory (e.g. before calling `NodeStore::write`) can validate it without
/// a round trip through disk.
pub fn validate_body(id: &str, body: &str) -> Result<()> {
    for line in body.split('\n') {
        if line.trim_end_matches('\r').starts_with("connections:") {
            return Err(Error::ConnectionsInBody(PathBuf::from(format!("{id}.md"))));
        }
    }
    Ok(())
}

/// Checks that `priority`, where present, falls in `1..=5`.
pub fn validate_priority(id: &str, priority: u8) -> Result<()> {
    if (1..=5).contains(&priority) {
        Ok(())
    } else {
        Err(Error::InvalidFormat {
            path: PathBuf::from(format!("{id}.md")),
            reason: format!("priority {priority} out of range 1..=5"),
        })
    }
}

/// Validates a single node in isolation: non-empty id/title, a
/// `connections:`-free body, and (when the node's context carries one) a
/// priority in range.
pub fn validate_node(node: &Node) -> Result<()> {
    if node.id.is_empty() {
        return Err(Error::MissingRequiredField {
            path: PathBuf::from("<unsaved>"),
            field: "id",
        });
    }
    if node.title.is_empty() {
        return Err(Error::MissingRequiredField {
            path: PathBuf::from(format!("{}.md", node.id)),
            field: "title",
        });
    }
    validate_body(&node.id, &node.body)?;
    if let Some(priority) = node.priority() {
        validate_priority(&node.id, priority)?;
    }
    Ok(())
}

/// Checks that every node in the collection has a unique `id`. The first duplicate
/// encountered (in scan order) is reported.
pub fn validate_unique_ids(nodes: &[Node]) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(nodes.len());
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(Error::InvalidFormat {
                path: PathBuf::from(format!("{}.md", node.id)),
                reason: format!("duplicate node id `{}`", node.id),
            });
        }
    }
    Ok(())
}

/// Runs every collection-wide invariant over `nodes`.
/// Individual per-node checks are *not* repeated here beyond uniqueness,
/// since `cortex-store::NodeStore::scan` already filtered out per-node
/// structural failures.
pub fn validate_collection(nodes: &[Node]) -> Result<()> {
    validate_unique_ids(nodes)
}
