//! Evaluates a parsed condition tree against a [`Node`].

use crate::ast::{Expr, Op, TargetSpec, Value};
use cortex_core::{ConnectionType, Node};
use indexmap::IndexMap;
use std::str::FromStr;

/// Lookup context for link sub-queries: evaluating `link(conn_type,
/// type:requirement)` needs to resolve the connection's target node, which
/// the `Expr`/`Node` pair alone can't do.
pub struct EvalCtx<'a> {
    nodes_by_id: &'a IndexMap<String, Node>,
}

impl<'a> EvalCtx<'a> {
    pub fn new(nodes_by_id: &'a IndexMap<String, Node>) -> Self {
        Self { nodes_by_id }
    }

    fn lookup(&self, id: &str) -> Option<&Node> {
        self.nodes_by_id.get(id)
    }
}

pub fn evaluate(expr: &Expr, node: &Node, ctx: &EvalCtx) -> bool {
    match expr {
        Expr::And(l, r) => evaluate(l, node, ctx) && evaluate(r, node, ctx),
        Expr::Or(l, r) => evaluate(l, node, ctx) || evaluate(r, node, ctx),
        Expr::Field { ident, op, value } => evaluate_field(ident, *op, value, node),
        Expr::Link { conn_type, target } => evaluate_link(conn_type, target, node, ctx),
    }
}

fn evaluate_field(ident: &str, op: Op, value: &Value, node: &Node) -> bool {
    if ident == "tag" {
        return node.tags.iter().any(|t| compare(op, t, &value.raw));
    }
    if let Some(name) = ident.strip_prefix("context.") {
        return match node.context.as_ref().and_then(|c| c.field(name)) {
            Some(v) => compare(op, &v, &value.raw),
            None => false,
        };
    }
    if let Some(name) = ident.strip_prefix("_llm.") {
        return evaluate_llm_field(name, op, value, node);
    }
    match resolve_scalar(ident, node) {
        Some(v) => compare(op, &v, &value.raw),
        None => false,
    }
}

fn evaluate_llm_field(name: &str, op: Op, value: &Value, node: &Node) -> bool {
    let Some(meta) = node.llm_metadata.as_ref() else {
        return false;
    };
    if name == "keywords" {
        return meta.keywords.iter().any(|k| compare(op, k, &value.raw));
    }
    let resolved = match name {
        "short_title" => meta.short_title.clone(),
        "density" => meta.density.map(|d| d.to_string()),
        "token_count" => meta.token_count.map(|t| t.to_string()),
        "strategy" => meta.strategy.clone(),
        _ => None,
    };
    match resolved {
        Some(v) => compare(op, &v, &value.raw),
        None => false,
    }
}

/// Resolves `type` and any direct scalar field on [`Node`] (`title`,
/// `language`, `hash`, `id`, `updated`, `body`).
fn resolve_scalar(ident: &str, node: &Node) -> Option<String> {
    match ident {
        "type" => Some(node.node_type.as_str().to_string()),
        "id" => Some(node.id.clone()),
        "title" => Some(node.title.clone()),
        "language" => Some(node.language.clone()),
        "hash" => node.hash.clone(),
        "updated" => node.updated.clone(),
        "body" => Some(node.body.clone()),
        _ => None,
    }
}

fn evaluate_link(conn_type: &str, target: &TargetSpec, node: &Node, ctx: &EvalCtx) -> bool {
    let Ok(conn_type) = ConnectionType::from_str(conn_type) else {
        return false;
    };
    let conns = node.connections_of(conn_type);
    match target {
        TargetSpec::Literal(id) => conns.iter().any(|c| &c.target_id == id),
        TargetSpec::SubQuery(expr) => conns.iter().any(|c| {
            ctx.lookup(&c.target_id)
                .is_some_and(|target_node| evaluate(expr, target_node, ctx))
        }),
    }
}

/// Compares `left` (a resolved field value) against `right` (the query's
/// literal) under `op`. Both sides are parsed as `f64` and compared
/// numerically when they both parse; otherwise comparison falls back to
/// case-sensitive string ordering/equality.
pub fn compare(op: Op, left: &str, right: &str) -> bool {
    if let (Ok(l), Ok(r)) = (left.parse::<f64>(), right.parse::<f64>()) {
        return match op {
            Op::Eq => l == r,
            Op::Neq => l != r,
            Op::Gt => l > r,
            Op::Lt => l < r,
            Op::Gte => l >= r,
            Op::Lte => l <= r,
            Op::Contains => left.contains(right),
            Op::NotContains => !left.contains(right),
        };
    }
    match op {
        Op::Eq => left == right,
        Op::Neq => left != right,
        Op::Gt => left > right,
        Op::Lt => left < right,
        Op::Gte => left >= right,
        Op::Lte => left <= right,
        Op::Contains => left.contains(right),
        Op::NotContains => !left.contains(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use cortex_core::{Connection, NodeContext, NodeType, RequirementStatus};

    fn nodes_map(nodes: Vec<Node>) -> IndexMap<String, Node> {
        nodes.into_iter().map(|n| (n.id.clone(), n)).collect()
    }

    #[test]
    fn matches_type_field() {
        let node = Node::new("a", "A", NodeType::Issue);
        let map = nodes_map(vec![node.clone()]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("type:issue").unwrap();
        assert!(evaluate(&expr, &node, &ctx));
    }

    #[test]
    fn matches_any_tag_element() {
        let mut node = Node::new("a", "A", NodeType::Concept);
        node.tags = vec!["p1".into(), "auth".into()];
        let map = nodes_map(vec![node.clone()]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("tag:auth").unwrap();
        assert!(evaluate(&expr, &node, &ctx));
    }

    #[test]
    fn numeric_comparison_on_context_priority() {
        let mut node = Node::new("a", "A", NodeType::Requirement);
        node.context = Some(NodeContext::Requirement {
            status: RequirementStatus::Draft,
            verification_method: "test".into(),
            priority: 4,
            assignee: None,
            effort_points: None,
            sprint: None,
        });
        let map = nodes_map(vec![node.clone()]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("context.priority:gte:3").unwrap();
        assert!(evaluate(&expr, &node, &ctx));
    }

    #[test]
    fn missing_context_field_does_not_match() {
        let node = Node::new("a", "A", NodeType::Concept);
        let map = nodes_map(vec![node.clone()]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("context.priority:gte:3").unwrap();
        assert!(!evaluate(&expr, &node, &ctx));
    }

    #[test]
    fn link_predicate_with_literal_target() {
        let mut node = Node::new("a", "A", NodeType::Issue);
        node.add_connection(ConnectionType::Blocks, Connection::new("req.auth", 50));
        let map = nodes_map(vec![node.clone()]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("link(blocks, req.auth)").unwrap();
        assert!(evaluate(&expr, &node, &ctx));
    }

    #[test]
    fn link_predicate_with_subquery_target() {
        let mut source = Node::new("a", "A", NodeType::Issue);
        source.add_connection(ConnectionType::Blocks, Connection::new("req.auth", 50));
        let target = Node::new("req.auth", "Auth Requirement", NodeType::Requirement);
        let map = nodes_map(vec![source.clone(), target]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("link(blocks, type:requirement)").unwrap();
        assert!(evaluate(&expr, &source, &ctx));
    }

    #[test]
    fn link_predicate_fails_when_target_missing_from_collection() {
        let mut source = Node::new("a", "A", NodeType::Issue);
        source.add_connection(ConnectionType::Blocks, Connection::new("ghost", 50));
        let map = nodes_map(vec![source.clone()]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("link(blocks, type:requirement)").unwrap();
        assert!(!evaluate(&expr, &source, &ctx));
    }

    #[test]
    fn and_or_composition_short_circuits_left_to_right() {
        let mut node = Node::new("a", "A", NodeType::Issue);
        node.tags = vec!["p1".into()];
        let map = nodes_map(vec![node.clone()]);
        let ctx = EvalCtx::new(&map);
        let expr = parse("type:issue AND tag:p1 OR tag:p2").unwrap();
        assert!(evaluate(&expr, &node, &ctx));
    }
}
