//! The structured query language's condition tree.

/// Comparison operator between a resolved field value and a literal.
/// Defaults to [`Op::Eq`] when a `Field` omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Gt,
    Lt,
    Gte,
    Lte,
    Contains,
    NotContains,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Neq => "neq",
            Op::Gt => "gt",
            Op::Lt => "lt",
            Op::Gte => "gte",
            Op::Lte => "lte",
            Op::Contains => "contains",
            Op::NotContains => "not_contains",
        }
    }

    pub fn from_str(s: &str) -> Option<Op> {
        Some(match s {
            "eq" => Op::Eq,
            "neq" => Op::Neq,
            "gt" => Op::Gt,
            "lt" => Op::Lt,
            "gte" => Op::Gte,
            "lte" => Op::Lte,
            "contains" => Op::Contains,
            "not_contains" => Op::NotContains,
            _ => return None,
        })
    }
}

/// A parsed `Value`: its unquoted content, plus whether the source used
/// quotes (needed so [`crate::parser::serialize`] can round-trip the
/// original spelling instead of always picking one quoting style).
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub raw: String,
    pub quoted: bool,
}

impl Value {
    pub fn bare(s: impl Into<String>) -> Self {
        Self {
            raw: s.into(),
            quoted: false,
        }
    }

    pub fn quoted(s: impl Into<String>) -> Self {
        Self {
            raw: s.into(),
            quoted: true,
        }
    }
}

/// The target of a `link(conn_type, target_spec)` predicate: either a literal target id, or a nested field
/// sub-query evaluated against the connection's target node.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSpec {
    Literal(String),
    SubQuery(Box<Expr>),
}

/// The structured query's condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Field {
        ident: String,
        op: Op,
        value: Value,
    },
    Link {
        conn_type: String,
        target: TargetSpec,
    },
}
