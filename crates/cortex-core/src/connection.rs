use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A typed, weighted, directed edge between two nodes.
///
/// Inverse pairs (e.g. `blocks`/`blocked_by`) are not materialised automatically;
/// callers add both directions explicitly when they want a bidirectional link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectionType {
    Parent,
    Child,
    Validates,
    ValidatedBy,
    Blocks,
    BlockedBy,
    Implements,
    ImplementedBy,
    TestedBy,
    Tests,
    RelatesTo,
    Prerequisite,
    Next,
    Related,
    Opposes,
}

impl ConnectionType {
    pub const ALL: [ConnectionType; 15] = [
        ConnectionType::Parent,
        ConnectionType::Child,
        ConnectionType::Validates,
        ConnectionType::ValidatedBy,
        ConnectionType::Blocks,
        ConnectionType::BlockedBy,
        ConnectionType::Implements,
        ConnectionType::ImplementedBy,
        ConnectionType::TestedBy,
        ConnectionType::Tests,
        ConnectionType::RelatesTo,
        ConnectionType::Prerequisite,
        ConnectionType::Next,
        ConnectionType::Related,
        ConnectionType::Opposes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionType::Parent => "parent",
            ConnectionType::Child => "child",
            ConnectionType::Validates => "validates",
            ConnectionType::ValidatedBy => "validated_by",
            ConnectionType::Blocks => "blocks",
            ConnectionType::BlockedBy => "blocked_by",
            ConnectionType::Implements => "implements",
            ConnectionType::ImplementedBy => "implemented_by",
            ConnectionType::TestedBy => "tested_by",
            ConnectionType::Tests => "tests",
            ConnectionType::RelatesTo => "relates_to",
            ConnectionType::Prerequisite => "prerequisite",
            ConnectionType::Next => "next",
            ConnectionType::Related => "related",
            ConnectionType::Opposes => "opposes",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known connection type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownConnectionType(pub String);

impl fmt::Display for UnknownConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown connection type: {}", self.0)
    }
}

impl std::error::Error for UnknownConnectionType {}

impl FromStr for ConnectionType {
    type Err = UnknownConnectionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for variant in ConnectionType::ALL {
            if variant.as_str() == s {
                return Ok(variant);
            }
        }
        Err(UnknownConnectionType(s.to_string()))
    }
}

/// One outgoing edge: a target node id and an integer weight in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub target_id: String,
    pub weight: u8,
}

impl Connection {
    pub fn new(target_id: impl Into<String>, weight: u8) -> Self {
        Self {
            target_id: target_id.into(),
            weight: weight.min(100),
        }
    }
}
