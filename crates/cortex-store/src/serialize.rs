//! Renders a [`Node`] back into the on-disk front-matter + body format.
//! Field order is fixed so that two writers never produce a
//! diff-noisy file for equivalent content, and `type: concept` /
//! `language: en` / an absent `hash` are all elided since they're the
//! defaults a reader assumes.

use cortex_core::{Node, NodeContext, NodeType};
use itertools::Itertools;
use std::fmt::Write as _;

pub fn serialize_node(node: &Node) -> String {
    let mut out = String::new();
    out.push_str("---\n");

    writeln!(out, "id: {}", scalar(&node.id)).unwrap();
    writeln!(out, "title: {}", scalar(&node.title)).unwrap();
    if !node.tags.is_empty() {
        writeln!(out, "tags: {}", inline_list(&node.tags)).unwrap();
    }
    if node.node_type != NodeType::Concept {
        writeln!(out, "type: {}", node.node_type.as_str()).unwrap();
    }
    if !node.connections.is_empty() {
        let entries: Vec<String> = node
            .connections
            .iter()
            .flat_map(|(conn_type, conns)| {
                conns
                    .iter()
                    .map(move |c| format!("{}:{}:{}", conn_type.as_str(), c.target_id, c.weight))
            })
            .collect();
        writeln!(out, "connections: {}", inline_list(&entries)).unwrap();
    }
    if let Some(updated) = &node.updated {
        writeln!(out, "updated: {}", scalar(updated)).unwrap();
    }
    if node.language != "en" {
        writeln!(out, "language: {}", scalar(&node.language)).unwrap();
    }
    if let Some(hash) = &node.hash {
        writeln!(out, "hash: {}", scalar(hash)).unwrap();
    }

    if let Some(llm) = &node.llm_metadata {
        out.push_str("_llm:\n");
        if let Some(t) = &llm.short_title {
            writeln!(out, "  t: {}", scalar(t)).unwrap();
        }
        if let Some(d) = llm.density {
            writeln!(out, "  d: {d}").unwrap();
        }
        if !llm.keywords.is_empty() {
            writeln!(out, "  k: {}", inline_list(&llm.keywords)).unwrap();
        }
        if let Some(c) = llm.token_count {
            writeln!(out, "  c: {c}").unwrap();
        }
        if let Some(strategy) = &llm.strategy {
            writeln!(out, "  strategy: {}", scalar(strategy)).unwrap();
        }
    }

    if let Some(context) = &node.context {
        out.push_str("context:\n");
        write_context_fields(&mut out, context);
    }

    out.push_str("---\n");
    out.push_str(&node.body);
    out
}

fn write_context_fields(out: &mut String, context: &NodeContext) {
    let mut line = |key: &str, value: String| {
        writeln!(out, "  {key}: {value}").unwrap();
    };
    let mut opt_line = |key: &str, value: &Option<String>| {
        if let Some(v) = value {
            writeln!(out, "  {key}: {}", scalar(v)).unwrap();
        }
    };

    match context {
        NodeContext::Requirement {
            status,
            verification_method,
            priority,
            assignee,
            effort_points,
            sprint,
        } => {
            line("status", status.to_string());
            line("verification_method", scalar(verification_method));
            line("priority", priority.to_string());
            opt_line("assignee", assignee);
            if let Some(ep) = effort_points {
                line("effort_points", ep.to_string());
            }
            opt_line("sprint", sprint);
        }
        NodeContext::TestCase {
            framework,
            test_file,
            status,
            priority,
            assignee,
            duration,
            last_run,
        } => {
            line("framework", scalar(framework));
            opt_line("test_file", test_file);
            line("status", status.to_string());
            line("priority", priority.to_string());
            opt_line("assignee", assignee);
            opt_line("duration", duration);
            opt_line("last_run", last_run);
        }
        NodeContext::Issue {
            status,
            priority,
            assignee,
            created,
            resolved,
            closed,
            blocked_by,
            related_to,
        } => {
            line("status", status.to_string());
            line("priority", priority.to_string());
            opt_line("assignee", assignee);
            line("created", scalar(created));
            opt_line("resolved", resolved);
            opt_line("closed", closed);
            if !blocked_by.is_empty() {
                writeln!(out, "  blocked_by: {}", inline_list(blocked_by)).unwrap();
            }
            if !related_to.is_empty() {
                writeln!(out, "  related_to: {}", inline_list(related_to)).unwrap();
            }
        }
        NodeContext::StateMachine {
            triggers,
            entry_action,
            exit_action,
            allowed_roles,
        } => {
            if !triggers.is_empty() {
                writeln!(out, "  triggers: {}", inline_list(triggers)).unwrap();
            }
            line("entry_action", scalar(entry_action));
            line("exit_action", scalar(exit_action));
            if !allowed_roles.is_empty() {
                writeln!(out, "  allowed_roles: {}", inline_list(allowed_roles)).unwrap();
            }
        }
        NodeContext::Artifact {
            runtime,
            file_path,
            safe_to_exec,
            language_version,
            last_modified,
        } => {
            line("runtime", scalar(runtime));
            line("file_path", scalar(file_path));
            line("safe_to_exec", safe_to_exec.to_string());
            opt_line("language_version", language_version);
            opt_line("last_modified", last_modified);
        }
        NodeContext::Custom(map) => {
            for key in map.keys().sorted() {
                line(key, scalar(&map[key]));
            }
        }
    }
}

fn inline_list(items: &[String]) -> String {
    format!("[{}]", items.iter().map(|s| scalar(s)).join(", "))
}

/// Quotes a scalar when its unquoted form would be ambiguous against the
/// restricted-YAML reader in `yaml.rs` (a `:` would look like a new
/// key/value split, a leading/trailing space would be trimmed away, and
/// the bare words `null`/`true`/`false`/numbers would change type on re-read).
fn scalar(s: &str) -> String {
    let needs_quote = s.is_empty()
        || s.contains(':')
        || s.contains(',')
        || s.contains('[')
        || s.contains(']')
        || s.contains('#')
        || s.starts_with(' ')
        || s.ends_with(' ')
        || matches!(s, "null" | "true" | "false")
        || s.parse::<f64>().is_ok();
    if needs_quote {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s.to_string()
    }
}
