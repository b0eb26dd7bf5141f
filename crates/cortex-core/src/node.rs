use crate::connection::{Connection, ConnectionType};
use crate::context::{IssueStatus, LlmMetadata, NodeContext, RequirementStatus, TestCaseStatus};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The node's tagged type variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    Concept,
    Reference,
    Artifact,
    StateMachine,
    Lesson,
    Requirement,
    TestCase,
    Issue,
    Feature,
}

impl NodeType {
    pub const ALL: [NodeType; 9] = [
        NodeType::Concept,
        NodeType::Reference,
        NodeType::Artifact,
        NodeType::StateMachine,
        NodeType::Lesson,
        NodeType::Requirement,
        NodeType::TestCase,
        NodeType::Issue,
        NodeType::Feature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Concept => "concept",
            NodeType::Reference => "reference",
            NodeType::Artifact => "artifact",
            NodeType::StateMachine => "state_machine",
            NodeType::Lesson => "lesson",
            NodeType::Requirement => "requirement",
            NodeType::TestCase => "test_case",
            NodeType::Issue => "issue",
            NodeType::Feature => "feature",
        }
    }

    /// Unknown `type` strings default to `concept` with no error, so a file
    /// written by a newer node flavour still loads under an older reader.
    pub fn parse_lenient(s: &str) -> NodeType {
        NodeType::from_str(s).unwrap_or(NodeType::Concept)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for NodeType {
    fn default() -> Self {
        NodeType::Concept
    }
}

impl FromStr for NodeType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or(())
    }
}

/// The central entity of the knowledge graph.
///
/// A `Node` returned by the store is fully self-contained: every string it
/// holds is owned, so it may outlive the file or index that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub tags: Vec<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default = "default_language")]
    pub language: String,
    /// Keyed by connection type, preserving both the order connection types
    /// were first seen and the order targets were appended within each type.
    #[serde(default)]
    pub connections: IndexMap<ConnectionType, Vec<Connection>>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub llm_metadata: Option<LlmMetadata>,
    #[serde(default)]
    pub context: Option<NodeContext>,
    #[serde(default)]
    pub body: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl Node {
    pub fn new(id: impl Into<String>, title: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            node_type,
            tags: Vec::new(),
            updated: None,
            language: default_language(),
            connections: IndexMap::new(),
            hash: None,
            llm_metadata: None,
            context: None,
            body: String::new(),
        }
    }

    /// Appends a connection; connection types preserve first-seen order
    /// because `connections` iterates in `ConnectionType`'s declared order
    /// only insofar as callers insert them in that order — the store
    /// preserves *file* order by reading connections in the order they were
    /// written, which is what `add_connection` records.
    pub fn add_connection(&mut self, conn_type: ConnectionType, conn: Connection) {
        self.connections.entry(conn_type).or_default().push(conn);
    }

    pub fn connections_of(&self, conn_type: ConnectionType) -> &[Connection] {
        self.connections
            .get(&conn_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// True if this node has an outgoing connection of `conn_type` whose
    /// target id equals `target_id` (used by the `link(...)` query predicate
    /// when the predicate's target spec is a literal id).
    pub fn has_link_to(&self, conn_type: ConnectionType, target_id: &str) -> bool {
        self.connections_of(conn_type)
            .iter()
            .any(|c| c.target_id == target_id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Current `status`, for the three workflow types that carry one.
    pub fn status(&self) -> Option<String> {
        self.context.as_ref().and_then(NodeContext::status_str)
    }

    /// Current `priority` (1..=5), for the three workflow types that carry one.
    pub fn priority(&self) -> Option<u8> {
        self.context.as_ref().and_then(NodeContext::priority)
    }
}

/// The initial state name for a workflow type's `status` field, used by the
/// Node Store when a node file omits `context.status` entirely.
pub fn initial_status(node_type: NodeType) -> Option<&'static str> {
    match node_type {
        NodeType::Issue => Some(IssueStatus::Open.as_str()),
        NodeType::TestCase => Some(TestCaseStatus::NotRun.as_str()),
        NodeType::Requirement => Some(RequirementStatus::Draft.as_str()),
        _ => None,
    }
}
