//! Parses a node file's front-matter + body into a [`Node`].

use crate::yaml::{children_range, is_null, parse_inline_list, split_key_value, tokenize, unquote, Line};
use cortex_core::{
    Connection, ConnectionType, IssueStatus, LlmMetadata, Node, NodeContext, NodeType,
    RequirementStatus, TestCaseStatus,
};
use cortex_error::{Error, Result};
use indexmap::IndexMap;
use std::path::Path;

/// A context field's raw value before it is coerced into the typed variant:
/// either a single scalar (already unquoted) or an inline list.
enum RawValue {
    Scalar(String),
    List(Vec<String>),
}

impl RawValue {
    fn as_scalar(&self) -> Option<&str> {
        match self {
            RawValue::Scalar(s) => Some(s.as_str()),
            RawValue::List(_) => None,
        }
    }

    fn as_list(&self) -> Vec<String> {
        match self {
            RawValue::Scalar(s) => vec![s.clone()],
            RawValue::List(l) => l.clone(),
        }
    }

    fn to_joined_string(&self) -> String {
        match self {
            RawValue::Scalar(s) => s.clone(),
            RawValue::List(l) => l.join(","),
        }
    }
}

/// Returns the byte offset in `text` where the body begins — i.e. just past
/// the closing `---` delimiter line's newline — or `None` if `text` doesn't
/// open with a `---` delimited front-matter block.
///
/// Exposed crate-wide so [`crate::store::NodeStore::update_body`] can splice
/// a new body into the raw file bytes without touching anything before this
/// offset, instead of round-tripping the front-matter through [`parse_node`]
/// and [`crate::serialize::serialize_node`].
pub(crate) fn body_offset(text: &str) -> Option<usize> {
    let raw_lines: Vec<&str> = text.split('\n').collect();
    let mut delim_indices = raw_lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim_end_matches('\r') == "---")
        .map(|(i, _)| i);
    let first = delim_indices.next()?;
    if first != 0 {
        return None;
    }
    let second = delim_indices.next()?;

    // Walk the original text up through (and including) the closing "---"
    // line's newline, so the offset lands exactly at the start of the
    // unmodified body suffix.
    let mut offset = 0usize;
    for line in &raw_lines[..=second] {
        offset += line.len() + 1; // +1 for the '\n' that `split` consumed
    }
    Some(offset.min(text.len()))
}

/// Splits a full node-file document into its front-matter text and its body
/// text (body preserved byte-for-byte, including trailing newline).
fn split_document(text: &str) -> Option<(String, String)> {
    let raw_lines: Vec<&str> = text.split('\n').collect();
    let second = raw_lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim_end_matches('\r') == "---")
        .map(|(i, _)| i)
        .nth(1)?;
    let frontmatter = raw_lines[1..second].join("\n");
    let offset = body_offset(text)?;
    let body = text[offset..].to_string();
    Some((frontmatter, body))
}

/// Fails if the body contains a `connections:` line at column zero.
pub(crate) fn validate_body(path: &Path, body: &str) -> Result<()> {
    for line in body.split('\n') {
        if line.trim_end_matches('\r').starts_with("connections:") {
            return Err(Error::ConnectionsInBody(path.to_path_buf()));
        }
    }
    Ok(())
}

pub fn parse_node(path: &Path, text: &str) -> Result<Node> {
    let (frontmatter_text, body) = split_document(text)
        .ok_or_else(|| Error::InvalidFormat {
            path: path.to_path_buf(),
            reason: "missing `---` front-matter delimiters".to_string(),
        })?;

    validate_body(path, &body)?;

    let lines = tokenize(&frontmatter_text);

    let mut id: Option<String> = None;
    let mut title: Option<String> = None;
    let mut type_str: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut updated: Option<String> = None;
    let mut language: Option<String> = None;
    let mut hash: Option<String> = None;
    let mut connections: IndexMap<ConnectionType, Vec<Connection>> = IndexMap::new();
    let mut llm = LlmFields::default();
    let mut context_raw: IndexMap<String, RawValue> = IndexMap::new();

    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i];
        if line.indent != 0 {
            // Stray indentation at the top level (e.g. leftover from a block
            // we didn't fully consume) — skip defensively.
            i += 1;
            continue;
        }
        let (key, value) = split_key_value(line.content);
        let here = i;
        i += 1;
        let end = children_range(&lines, i, 0);

        match key {
            "id" => id = Some(unquote(value)),
            "title" => title = Some(unquote(value)),
            "type" => type_str = Some(unquote(value)),
            "language" => language = Some(unquote(value)),
            "updated" => updated = Some(unquote(value)),
            "hash" => {
                hash = if value.is_empty() || is_null(value) {
                    None
                } else {
                    Some(unquote(value))
                };
            }
            "tags" => {
                tags = if !value.is_empty() {
                    parse_inline_list(value)
                } else {
                    parse_plain_list_items(&lines, i, end, line.indent + 2)
                };
            }
            "connections" => {
                connections = if !value.is_empty() {
                    parse_flat_connections(path, here, value)?
                } else {
                    parse_nested_connections(&lines, i, end, line.indent + 2)
                };
            }
            "_llm" => {
                parse_llm_block(&lines, i, end, line.indent + 2, &mut llm);
            }
            "_llm_t" => llm.short_title = Some(unquote(value)),
            "_llm_d" => llm.density = value.parse().ok(),
            "_llm_k" => llm.keywords = parse_inline_list(value),
            "_llm_c" => llm.token_count = value.parse().ok(),
            "_llm_strategy" => llm.strategy = Some(unquote(value)),
            "context" => {
                context_raw = parse_context_block(&lines, i, end, line.indent + 2);
            }
            _ => {
                // Unknown top-level key: forward-compatible, ignore.
            }
        }

        i = end;
    }

    let id = id.ok_or_else(|| Error::MissingRequiredField {
        path: path.to_path_buf(),
        field: "id",
    })?;
    let title = title.ok_or_else(|| Error::MissingRequiredField {
        path: path.to_path_buf(),
        field: "title",
    })?;

    let node_type = type_str
        .as_deref()
        .map(NodeType::parse_lenient)
        .unwrap_or(NodeType::Concept);

    let mut node = Node::new(id, title, node_type);
    node.tags = tags;
    node.updated = updated;
    node.language = language.filter(|l| !l.is_empty()).unwrap_or_else(|| "en".to_string());
    node.hash = hash;
    node.connections = connections;
    node.llm_metadata = llm.into_metadata();
    node.context = build_context(node_type, &context_raw);
    node.body = body;

    Ok(node)
}

fn parse_plain_list_items(lines: &[Line<'_>], start: usize, end: usize, indent: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = start;
    while i < end {
        let line = lines[i];
        if line.indent == indent {
            if let Some(rest) = line.content.strip_prefix("- ") {
                out.push(unquote(rest.trim()));
            } else if line.content == "-" {
                // empty item, ignore
            }
        }
        i += 1;
    }
    out
}

fn parse_flat_connections(
    path: &Path,
    line_idx: usize,
    value: &str,
) -> Result<IndexMap<ConnectionType, Vec<Connection>>> {
    let mut out: IndexMap<ConnectionType, Vec<Connection>> = IndexMap::new();
    for entry in parse_inline_list(value) {
        let mut parts = entry.splitn(3, ':');
        let type_str = parts.next().unwrap_or("").trim();
        let target = parts.next().unwrap_or("").trim();
        let weight_str = parts.next().unwrap_or("0").trim();
        let conn_type: ConnectionType = type_str.parse().map_err(|_| Error::InvalidYaml {
            path: path.to_path_buf(),
            line: line_idx,
            reason: format!("unknown connection type `{type_str}` in `{entry}`"),
        })?;
        let weight: u8 = weight_str.parse().map_err(|_| Error::InvalidYaml {
            path: path.to_path_buf(),
            line: line_idx,
            reason: format!("invalid weight in `{entry}`"),
        })?;
        out.entry(conn_type)
            .or_default()
            .push(Connection::new(target, weight));
    }
    Ok(out)
}

fn parse_nested_connections(
    lines: &[Line<'_>],
    start: usize,
    end: usize,
    indent: usize,
) -> IndexMap<ConnectionType, Vec<Connection>> {
    let mut out: IndexMap<ConnectionType, Vec<Connection>> = IndexMap::new();
    let mut i = start;
    while i < end {
        let line = lines[i];
        if line.indent != indent {
            i += 1;
            continue;
        }
        let (key, _) = split_key_value(line.content);
        let Ok(conn_type) = key.parse::<ConnectionType>() else {
            i += 1;
            continue;
        };
        let item_start = i + 1;
        let item_end = children_range(lines, item_start, indent);
        let items = parse_list_items(lines, item_start, item_end, indent + 2);
        for item in items {
            let target = item.get("target_id").cloned().unwrap_or_default();
            let weight = item
                .get("weight")
                .and_then(|w| w.parse::<u8>().ok())
                .unwrap_or(0);
            out.entry(conn_type).or_default().push(Connection::new(target, weight));
        }
        i = item_end;
    }
    out
}

/// Parses a block of `- key: value` list items, where a new item begins at
/// `indent` and its subsequent fields are the more-deeply-indented lines
/// that follow, up to the next item marker or dedent.
fn parse_list_items(
    lines: &[Line<'_>],
    start: usize,
    end: usize,
    indent: usize,
) -> Vec<IndexMap<String, String>> {
    let mut items = Vec::new();
    let mut i = start;
    while i < end {
        let line = lines[i];
        if line.indent == indent {
            if let Some(rest) = line.content.strip_prefix("- ") {
                let mut map = IndexMap::new();
                let (k, v) = split_key_value(rest);
                map.insert(k.to_string(), unquote(v));
                i += 1;
                while i < end && lines[i].indent > indent {
                    let (k2, v2) = split_key_value(lines[i].content);
                    map.insert(k2.to_string(), unquote(v2));
                    i += 1;
                }
                items.push(map);
                continue;
            }
        }
        i += 1;
    }
    items
}

#[derive(Default)]
struct LlmFields {
    short_title: Option<String>,
    density: Option<u8>,
    keywords: Vec<String>,
    token_count: Option<u64>,
    strategy: Option<String>,
}

impl LlmFields {
    fn into_metadata(self) -> Option<LlmMetadata> {
        if self.short_title.is_none()
            && self.density.is_none()
            && self.keywords.is_empty()
            && self.token_count.is_none()
            && self.strategy.is_none()
        {
            return None;
        }
        Some(LlmMetadata {
            short_title: self.short_title,
            density: self.density,
            keywords: self.keywords,
            token_count: self.token_count,
            strategy: self.strategy,
        })
    }
}

fn parse_llm_block(lines: &[Line<'_>], start: usize, end: usize, indent: usize, out: &mut LlmFields) {
    let mut i = start;
    while i < end {
        let line = lines[i];
        if line.indent != indent {
            i += 1;
            continue;
        }
        let (key, value) = split_key_value(line.content);
        match key {
            "t" | "short_title" => out.short_title = Some(unquote(value)),
            "d" | "density" => out.density = value.parse().ok(),
            "k" | "keywords" => out.keywords = parse_inline_list(value),
            "c" | "token_count" => out.token_count = value.parse().ok(),
            "strategy" => out.strategy = Some(unquote(value)),
            _ => {}
        }
        i += 1;
    }
}

fn parse_context_block(
    lines: &[Line<'_>],
    start: usize,
    end: usize,
    indent: usize,
) -> IndexMap<String, RawValue> {
    let mut out = IndexMap::new();
    let mut i = start;
    while i < end {
        let line = lines[i];
        if line.indent != indent {
            i += 1;
            continue;
        }
        let (key, value) = split_key_value(line.content);
        let value = if value.starts_with('[') {
            RawValue::List(parse_inline_list(value))
        } else {
            RawValue::Scalar(unquote(value))
        };
        out.insert(key.to_string(), value);
        i += 1;
    }
    out
}

fn get_scalar(raw: &IndexMap<String, RawValue>, key: &str) -> Option<String> {
    raw.get(key).and_then(|v| v.as_scalar()).map(|s| s.to_string())
}

fn get_list(raw: &IndexMap<String, RawValue>, key: &str) -> Vec<String> {
    raw.get(key).map(|v| v.as_list()).unwrap_or_default()
}

fn get_priority(raw: &IndexMap<String, RawValue>) -> u8 {
    get_scalar(raw, "priority")
        .and_then(|s| s.parse::<u8>().ok())
        .filter(|p| (1..=5).contains(p))
        .unwrap_or(3)
}

/// Builds the type-dependent context variant from the raw front-matter
/// fields.
fn build_context(node_type: NodeType, raw: &IndexMap<String, RawValue>) -> Option<NodeContext> {
    match node_type {
        NodeType::Requirement => Some(NodeContext::Requirement {
            status: get_scalar(raw, "status")
                .and_then(|s| s.parse::<RequirementStatus>().ok())
                .unwrap_or(RequirementStatus::Draft),
            verification_method: get_scalar(raw, "verification_method").unwrap_or_default(),
            priority: get_priority(raw),
            assignee: get_scalar(raw, "assignee"),
            effort_points: get_scalar(raw, "effort_points").and_then(|s| s.parse().ok()),
            sprint: get_scalar(raw, "sprint"),
        }),
        NodeType::TestCase => Some(NodeContext::TestCase {
            framework: get_scalar(raw, "framework").unwrap_or_default(),
            test_file: get_scalar(raw, "test_file"),
            status: get_scalar(raw, "status")
                .and_then(|s| s.parse::<TestCaseStatus>().ok())
                .unwrap_or(TestCaseStatus::NotRun),
            priority: get_priority(raw),
            assignee: get_scalar(raw, "assignee"),
            duration: get_scalar(raw, "duration"),
            last_run: get_scalar(raw, "last_run"),
        }),
        NodeType::Issue => Some(NodeContext::Issue {
            status: get_scalar(raw, "status")
                .and_then(|s| s.parse::<IssueStatus>().ok())
                .unwrap_or(IssueStatus::Open),
            priority: get_priority(raw),
            assignee: get_scalar(raw, "assignee"),
            created: get_scalar(raw, "created").unwrap_or_default(),
            resolved: get_scalar(raw, "resolved"),
            closed: get_scalar(raw, "closed"),
            blocked_by: get_list(raw, "blocked_by"),
            related_to: get_list(raw, "related_to"),
        }),
        NodeType::StateMachine => {
            if raw.is_empty() {
                return None;
            }
            Some(NodeContext::StateMachine {
                triggers: get_list(raw, "triggers"),
                entry_action: get_scalar(raw, "entry_action").unwrap_or_default(),
                exit_action: get_scalar(raw, "exit_action").unwrap_or_default(),
                allowed_roles: get_list(raw, "allowed_roles"),
            })
        }
        NodeType::Artifact => {
            if raw.is_empty() {
                return None;
            }
            Some(NodeContext::Artifact {
                runtime: get_scalar(raw, "runtime").unwrap_or_default(),
                file_path: get_scalar(raw, "file_path").unwrap_or_default(),
                safe_to_exec: get_scalar(raw, "safe_to_exec")
                    .map(|s| s == "true")
                    .unwrap_or(false),
                language_version: get_scalar(raw, "language_version"),
                last_modified: get_scalar(raw, "last_modified"),
            })
        }
        NodeType::Feature | NodeType::Lesson | NodeType::Reference => {
            if raw.is_empty() {
                return None;
            }
            let map = raw
                .iter()
                .map(|(k, v)| (k.clone(), v.to_joined_string()))
                .collect();
            Some(NodeContext::Custom(map))
        }
        NodeType::Concept => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(frontmatter: &str, body: &str) -> String {
        format!("---\n{frontmatter}\n---\n{body}")
    }

    #[test]
    fn parses_minimal_concept_node() {
        let text = doc("id: note.1\ntitle: A Note\n", "Hello world.\n");
        let node = parse_node(Path::new("note.1.md"), &text).unwrap();
        assert_eq!(node.id, "note.1");
        assert_eq!(node.title, "A Note");
        assert_eq!(node.node_type, NodeType::Concept);
        assert_eq!(node.language, "en");
        assert_eq!(node.body, "Hello world.\n");
    }

    #[test]
    fn missing_id_is_a_parse_error() {
        let text = doc("title: No Id\n", "body\n");
        let err = parse_node(Path::new("x.md"), &text).unwrap_err();
        assert!(matches!(err, Error::MissingRequiredField { field: "id", .. }));
    }

    #[test]
    fn connections_in_body_is_rejected() {
        let text = doc("id: a\ntitle: A\n", "intro\nconnections:\n  - oops\n");
        let err = parse_node(Path::new("a.md"), &text).unwrap_err();
        assert!(matches!(err, Error::ConnectionsInBody(_)));
    }

    #[test]
    fn parses_flat_connections_form() {
        let text = doc(
            "id: req.auth\ntitle: Auth\nconnections: [\"tested_by:test.auth:90\"]\n",
            "body\n",
        );
        let node = parse_node(Path::new("x.md"), &text).unwrap();
        let conns = node.connections_of(ConnectionType::TestedBy);
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].target_id, "test.auth");
        assert_eq!(conns[0].weight, 90);
    }

    #[test]
    fn parses_nested_connections_form() {
        let text = doc(
            "id: req.auth\ntitle: Auth\nconnections:\n  parent:\n    - target_id: epic.1\n      weight: 90\n",
            "body\n",
        );
        let node = parse_node(Path::new("x.md"), &text).unwrap();
        let conns = node.connections_of(ConnectionType::Parent);
        assert_eq!(conns.len(), 1);
        assert_eq!(conns[0].target_id, "epic.1");
        assert_eq!(conns[0].weight, 90);
    }

    #[test]
    fn parses_requirement_context_and_defaults_priority() {
        let text = doc(
            "id: req.auth\ntitle: Login\ntype: requirement\ntags: [security, p1]\ncontext:\n  status: draft\n  verification_method: test\n  priority: 2\n",
            "Body text.\n",
        );
        let node = parse_node(Path::new("req.auth.md"), &text).unwrap();
        assert_eq!(node.tags, vec!["security", "p1"]);
        assert_eq!(node.priority(), Some(2));
        assert_eq!(node.status().as_deref(), Some("draft"));
    }

    #[test]
    fn issue_without_explicit_status_gets_initial_state() {
        let text = doc(
            "id: issue.1\ntitle: Bug\ntype: issue\ncontext:\n  created: \"2024-01-01\"\n",
            "Body.\n",
        );
        let node = parse_node(Path::new("issue.1.md"), &text).unwrap();
        assert_eq!(node.status().as_deref(), Some("open"));
    }

    #[test]
    fn reads_legacy_flattened_llm_fields() {
        let text = doc(
            "id: a\ntitle: A\n_llm_t: short\n_llm_d: 2\n_llm_k: [x, y]\n",
            "body\n",
        );
        let node = parse_node(Path::new("a.md"), &text).unwrap();
        let llm = node.llm_metadata.unwrap();
        assert_eq!(llm.short_title.as_deref(), Some("short"));
        assert_eq!(llm.density, Some(2));
        assert_eq!(llm.keywords, vec!["x", "y"]);
    }

    #[test]
    fn reads_nested_llm_block() {
        let text = doc(
            "id: a\ntitle: A\n_llm:\n  t: \"short\"\n  d: 3\n  k: [a, b]\n",
            "body\n",
        );
        let node = parse_node(Path::new("a.md"), &text).unwrap();
        let llm = node.llm_metadata.unwrap();
        assert_eq!(llm.short_title.as_deref(), Some("short"));
        assert_eq!(llm.density, Some(3));
    }

    #[test]
    fn unknown_type_defaults_to_concept_with_no_error() {
        let text = doc("id: a\ntitle: A\ntype: made_up\n", "body\n");
        let node = parse_node(Path::new("a.md"), &text).unwrap();
        assert_eq!(node.node_type, NodeType::Concept);
    }

    #[test]
    fn missing_delimiters_is_invalid_format() {
        let err = parse_node(Path::new("a.md"), "id: a\ntitle: A\n").unwrap_err();
        assert!(matches!(err, Error::InvalidFormat { .. }));
    }
}
