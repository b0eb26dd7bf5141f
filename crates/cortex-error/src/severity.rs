//! Coarse-grained classification for programmatic handling of errors.
//!
//! Batch operations (scan, sync) use this to decide whether to skip an item
//! and keep going or abort the whole operation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Safe to skip and continue (e.g. one bad node file during a scan).
    Recoverable,
    /// Surfaced to the caller as a failed operation, but does not corrupt
    /// any on-disk artifact.
    Fatal,
    /// Informational; not really a failure (e.g. `PathNotFound` from a
    /// shortest-path query is a valid result, not an error condition).
    Info,
}
