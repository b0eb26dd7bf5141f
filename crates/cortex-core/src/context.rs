use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

macro_rules! status_enum {
    ($name:ident { $($variant:ident => $s:expr),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} status: {other}", stringify!($name))),
                }
            }
        }
    };
}

status_enum!(IssueStatus {
    Open => "open",
    InProgress => "in_progress",
    Resolved => "resolved",
    Closed => "closed",
});

status_enum!(TestCaseStatus {
    NotRun => "not_run",
    Running => "running",
    Passing => "passing",
    Failing => "failing",
});

status_enum!(RequirementStatus {
    Draft => "draft",
    Approved => "approved",
    Implemented => "implemented",
});

/// `_llm` front-matter block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmMetadata {
    #[serde(default)]
    pub short_title: Option<String>,
    /// 1-4; summarisation density the content was generated at.
    #[serde(default)]
    pub density: Option<u8>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub token_count: Option<u64>,
    #[serde(default)]
    pub strategy: Option<String>,
}

/// Type-dependent context payload.
///
/// `concept` nodes and any unrecognised `type` carry no context at all;
/// `feature`, `lesson`, `reference` and anything else unclassified fall back
/// to [`NodeContext::Custom`], a free-form string map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NodeContext {
    Requirement {
        status: RequirementStatus,
        verification_method: String,
        priority: u8,
        #[serde(default)]
        assignee: Option<String>,
        #[serde(default)]
        effort_points: Option<u32>,
        #[serde(default)]
        sprint: Option<String>,
    },
    TestCase {
        framework: String,
        #[serde(default)]
        test_file: Option<String>,
        status: TestCaseStatus,
        priority: u8,
        #[serde(default)]
        assignee: Option<String>,
        #[serde(default)]
        duration: Option<String>,
        #[serde(default)]
        last_run: Option<String>,
    },
    Issue {
        status: IssueStatus,
        priority: u8,
        #[serde(default)]
        assignee: Option<String>,
        created: String,
        #[serde(default)]
        resolved: Option<String>,
        #[serde(default)]
        closed: Option<String>,
        #[serde(default)]
        blocked_by: Vec<String>,
        #[serde(default)]
        related_to: Vec<String>,
    },
    StateMachine {
        #[serde(default)]
        triggers: Vec<String>,
        entry_action: String,
        exit_action: String,
        #[serde(default)]
        allowed_roles: Vec<String>,
    },
    Artifact {
        runtime: String,
        file_path: String,
        safe_to_exec: bool,
        #[serde(default)]
        language_version: Option<String>,
        #[serde(default)]
        last_modified: Option<String>,
    },
    /// `feature`, `lesson`, `reference`, and any unclassified type: an
    /// unstructured string map, populated from whatever scalar fields
    /// appeared under the front-matter's context block.
    Custom(HashMap<String, String>),
}

impl NodeContext {
    /// Looks up a scalar field inside the context by name, formatting
    /// non-string values the way the structured query language expects.
    pub fn field(&self, name: &str) -> Option<String> {
        match self {
            NodeContext::Requirement {
                status,
                verification_method,
                priority,
                assignee,
                effort_points,
                sprint,
            } => match name {
                "status" => Some(status.to_string()),
                "verification_method" => Some(verification_method.clone()),
                "priority" => Some(priority.to_string()),
                "assignee" => assignee.clone(),
                "effort_points" => effort_points.map(|v| v.to_string()),
                "sprint" => sprint.clone(),
                _ => None,
            },
            NodeContext::TestCase {
                framework,
                test_file,
                status,
                priority,
                assignee,
                duration,
                last_run,
            } => match name {
                "framework" => Some(framework.clone()),
                "test_file" => test_file.clone(),
                "status" => Some(status.to_string()),
                "priority" => Some(priority.to_string()),
                "assignee" => assignee.clone(),
                "duration" => duration.clone(),
                "last_run" => last_run.clone(),
                _ => None,
            },
            NodeContext::Issue {
                status,
                priority,
                assignee,
                created,
                resolved,
                closed,
                blocked_by,
                related_to,
            } => match name {
                "status" => Some(status.to_string()),
                "priority" => Some(priority.to_string()),
                "assignee" => assignee.clone(),
                "created" => Some(created.clone()),
                "resolved" => resolved.clone(),
                "closed" => closed.clone(),
                "blocked_by" => Some(blocked_by.join(",")),
                "related_to" => Some(related_to.join(",")),
                _ => None,
            },
            NodeContext::StateMachine {
                triggers,
                entry_action,
                exit_action,
                allowed_roles,
            } => match name {
                "triggers" => Some(triggers.join(",")),
                "entry_action" => Some(entry_action.clone()),
                "exit_action" => Some(exit_action.clone()),
                "allowed_roles" => Some(allowed_roles.join(",")),
                _ => None,
            },
            NodeContext::Artifact {
                runtime,
                file_path,
                safe_to_exec,
                language_version,
                last_modified,
            } => match name {
                "runtime" => Some(runtime.clone()),
                "file_path" => Some(file_path.clone()),
                "safe_to_exec" => Some(safe_to_exec.to_string()),
                "language_version" => language_version.clone(),
                "last_modified" => last_modified.clone(),
                _ => None,
            },
            NodeContext::Custom(map) => map.get(name).cloned(),
        }
    }

    /// The `status` field, when this variant has one (issue/test_case/requirement).
    pub fn status_str(&self) -> Option<String> {
        match self {
            NodeContext::Requirement { status, .. } => Some(status.to_string()),
            NodeContext::TestCase { status, .. } => Some(status.to_string()),
            NodeContext::Issue { status, .. } => Some(status.to_string()),
            _ => None,
        }
    }

    /// The `priority` field, when this variant has one.
    pub fn priority(&self) -> Option<u8> {
        match self {
            NodeContext::Requirement { priority, .. }
            | NodeContext::TestCase { priority, .. }
            | NodeContext::Issue { priority, .. } => Some(*priority),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_enum_round_trips() {
        assert_eq!("open".parse::<IssueStatus>().unwrap(), IssueStatus::Open);
        assert_eq!(IssueStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn context_field_resolves_dot_path_targets() {
        let ctx = NodeContext::Requirement {
            status: RequirementStatus::Draft,
            verification_method: "test".into(),
            priority: 2,
            assignee: None,
            effort_points: None,
            sprint: None,
        };
        assert_eq!(ctx.field("status").as_deref(), Some("draft"));
        assert_eq!(ctx.field("priority").as_deref(), Some("2"));
        assert_eq!(ctx.field("nonexistent"), None);
    }
}
