//! cortex-error — the shared error vocabulary for the cortex engine workspace.
//!
//! A single [`Error`] enum is used by every other crate in the workspace so
//! that callers never have to match on crate-specific error types when
//! composing operations across the Node Store, Graph, indices, and Query
//! Engine. Each variant corresponds to one row of the error taxonomy;
//! [`Error::severity`] gives its recoverability classification
//! programmatically so batch operations (scan, sync) can decide to
//! skip-and-continue instead of aborting.
//!
//! Library code in this workspace never logs or prints an error directly;
//! it returns `Result<T>` and lets the caller (ultimately the CLI adapter)
//! decide how to report it.

mod severity;

use std::path::PathBuf;

pub use severity::Severity;

/// Result alias used throughout the cortex engine workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("invalid node file format at {path}: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("{path}: missing required field `{field}`")]
    MissingRequiredField { path: PathBuf, field: &'static str },

    #[error("{path}: invalid front-matter YAML at line {line}: {reason}")]
    InvalidYaml {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("{0}: body contains a `connections:` block, which must live in front-matter")]
    ConnectionsInBody(PathBuf),

    #[error("invalid magic bytes: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: [u8; 4], found: [u8; 4] },

    #[error("unsupported index format version {found} (max supported {max})")]
    UnsupportedVersion { found: u32, max: u32 },

    #[error("checksum mismatch reading {0}")]
    ChecksumMismatch(PathBuf),

    #[error("illegal {node_type} transition: {from} -> {to}")]
    InvalidTransition {
        node_type: &'static str,
        from: String,
        to: String,
    },

    #[error("vector dimension mismatch: index is dim {expected}, got dim {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("no path between {from} and {to}")]
    PathNotFound { from: String, to: String },

    #[error("query parse error at position {pos}: {reason}")]
    QueryParseError { pos: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Coarse severity classification, used by batch operations to decide
    /// whether to keep going.
    pub fn severity(&self) -> Severity {
        match self {
            Error::InvalidFormat { .. }
            | Error::MissingRequiredField { .. }
            | Error::InvalidYaml { .. }
            | Error::InvalidMagic { .. }
            | Error::UnsupportedVersion { .. }
            | Error::ChecksumMismatch { .. } => Severity::Recoverable,
            Error::PathNotFound { .. } => Severity::Info,
            Error::FileNotFound(_)
            | Error::ConnectionsInBody(_)
            | Error::InvalidTransition { .. }
            | Error::DimensionMismatch { .. }
            | Error::QueryParseError { .. }
            | Error::Io(_) => Severity::Fatal,
        }
    }

    /// True for errors that a batch scan/sync should log and skip past
    /// rather than abort on.
    pub fn is_recoverable_in_batch(&self) -> bool {
        matches!(self.severity(), Severity::Recoverable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_errors_are_skippable_in_batch() {
        let err = Error::InvalidYaml {
            path: PathBuf::from("x.md"),
            line: 3,
            reason: "bad".into(),
        };
        assert!(err.is_recoverable_in_batch());
    }

    #[test]
    fn fatal_errors_are_not_skippable_in_batch() {
        let err = Error::FileNotFound(PathBuf::from("x.md"));
        assert!(!err.is_recoverable_in_batch());
    }

    #[test]
    fn path_not_found_is_informational() {
        let err = Error::PathNotFound {
            from: "a".into(),
            to: "b".into(),
        };
        assert_eq!(err.severity(), Severity::Info);
    }
}
