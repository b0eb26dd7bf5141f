//! Type-specific workflow transition validation.
//!
//! Only the three workflow types that carry a `status` (`issue`, `test_case`,
//! `requirement`) have a transition table; every other [`NodeType`] has none,
//! so [`legal_transitions`] returns an empty slice and [`validate_transition`]
//! rejects any transition attempt on them.

use cortex_core::NodeType;
use cortex_error::{Error, Result};

/// One allowed `(from, to)` pair in a type's transition table.
type Transition = (&'static str, &'static str);

const ISSUE_TRANSITIONS: &[Transition] = &[
    ("open", "in_progress"),
    ("in_progress", "open"),
    ("in_progress", "resolved"),
    ("resolved", "in_progress"),
    ("resolved", "closed"),
];

const TEST_CASE_TRANSITIONS: &[Transition] = &[
    ("not_run", "running"),
    ("running", "passing"),
    ("running", "failing"),
    ("passing", "running"),
    ("failing", "running"),
];

const REQUIREMENT_TRANSITIONS: &[Transition] = &[
    ("draft", "approved"),
    ("approved", "draft"),
    ("approved", "implemented"),
    ("implemented", "approved"),
];

/// The transition table for `node_type`, or an empty slice for types with no
/// workflow `status`.
fn legal_transitions(node_type: NodeType) -> &'static [Transition] {
    match node_type {
        NodeType::Issue => ISSUE_TRANSITIONS,
        NodeType::TestCase => TEST_CASE_TRANSITIONS,
        NodeType::Requirement => REQUIREMENT_TRANSITIONS,
        _ => &[],
    }
}

fn type_name(node_type: NodeType) -> &'static str {
    node_type.as_str()
}

/// Checks whether `from -> to` is a legal transition for `node_type`,
/// regardless of `force`. Used by callers that want to know the answer
/// without committing to mutating a node.
pub fn is_legal(node_type: NodeType, from: &str, to: &str) -> bool {
    legal_transitions(node_type)
        .iter()
        .any(|(f, t)| *f == from && *t == to)
}

/// Validates a `from -> to` transition for `node_type`.
///
/// `force = true` bypasses the check entirely and always succeeds — intended
/// for initial data loading, never for an interactive edit.
pub fn validate_transition(node_type: NodeType, from: &str, to: &str, force: bool) -> Result<()> {
    if force || is_legal(node_type, from, to) {
        return Ok(());
    }
    Err(Error::InvalidTransition {
        node_type: type_name(node_type),
        from: from.to_string(),
        to: to.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_open_to_closed_is_rejected_without_force() {
        let err = validate_transition(NodeType::Issue, "open", "closed", false).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }

    #[test]
    fn issue_open_to_in_progress_is_legal() {
        assert!(validate_transition(NodeType::Issue, "open", "in_progress", false).is_ok());
    }

    #[test]
    fn force_bypasses_an_illegal_transition() {
        assert!(validate_transition(NodeType::Issue, "closed", "open", true).is_ok());
    }

    #[test]
    fn closed_is_terminal_for_issue() {
        assert!(!is_legal(NodeType::Issue, "closed", "open"));
        assert!(!is_legal(NodeType::Issue, "closed", "in_progress"));
    }

    #[test]
    fn test_case_running_branches_to_passing_or_failing() {
        assert!(is_legal(NodeType::TestCase, "running", "passing"));
        assert!(is_legal(NodeType::TestCase, "running", "failing"));
        assert!(!is_legal(NodeType::TestCase, "not_run", "passing"));
    }

    #[test]
    fn requirement_round_trips_between_draft_and_approved() {
        assert!(is_legal(NodeType::Requirement, "draft", "approved"));
        assert!(is_legal(NodeType::Requirement, "approved", "draft"));
        assert!(is_legal(NodeType::Requirement, "approved", "implemented"));
        assert!(!is_legal(NodeType::Requirement, "draft", "implemented"));
    }

    #[test]
    fn non_workflow_types_have_no_legal_transitions() {
        assert!(!is_legal(NodeType::Concept, "anything", "else"));
        let err = validate_transition(NodeType::Concept, "a", "b", false).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
    }
}
