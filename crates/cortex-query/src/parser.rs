//! Hand-rolled recursive-descent parser for the structured query grammar,
//! mirroring the style of `cortex-store`'s hand-rolled front-matter reader:
//! the grammar is small and fixed, so a general parser-generator or
//! combinator crate would be overkill.
//!
//! Operator precedence is left-to-right with no implicit binding between
//! `AND`/`OR`: `A AND B OR C` parses as `(A AND B) OR C` purely by
//! left-to-right encounter order, never by AND binding tighter. Explicit
//! parentheses always override.

use crate::ast::{Expr, Op, TargetSpec, Value};
use cortex_error::{Error, Result};

pub fn parse(input: &str) -> Result<Expr> {
    let mut p = Parser { input, pos: 0 };
    p.skip_ws();
    let expr = p.parse_expr()?;
    p.skip_ws();
    if p.pos != p.input.len() {
        return Err(Error::QueryParseError {
            pos: p.pos,
            reason: format!("unexpected trailing input: `{}`", &p.input[p.pos..]),
        });
    }
    Ok(expr)
}

/// True when `query` should be treated as a structured query rather than a
/// natural-language text-mode query: it
/// contains a top-level `:` outside quotes, and doesn't begin with `|` or
/// `?`.
pub fn is_structured(query: &str) -> bool {
    let trimmed = query.trim_start();
    if trimmed.starts_with('|') || trimmed.starts_with('?') {
        return false;
    }
    let mut in_quote: Option<char> = None;
    for ch in query.chars() {
        match in_quote {
            Some(q) => {
                if ch == q {
                    in_quote = None;
                }
            }
            None => {
                if ch == '"' || ch == '\'' {
                    in_quote = Some(ch);
                } else if ch == ':' {
                    return true;
                }
            }
        }
    }
    false
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.peek() == Some(c) {
            self.advance();
            Ok(())
        } else {
            Err(Error::QueryParseError {
                pos: self.pos,
                reason: format!("expected `{c}`"),
            })
        }
    }

    fn consume_literal(&mut self, lit: &str) -> bool {
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    /// Consumes `AND`/`OR` as whole-word keywords (not a prefix of an
    /// identifier), requiring surrounding whitespace.
    fn try_consume_keyword(&mut self, kw: &str) -> bool {
        let save = self.pos;
        self.skip_ws();
        if self.consume_literal(kw) {
            let boundary_ok = self
                .peek()
                .map(|c| c.is_whitespace() || c == '(')
                .unwrap_or(true);
            if boundary_ok {
                return true;
            }
        }
        self.pos = save;
        false
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            if self.try_consume_keyword("AND") {
                self.skip_ws();
                let right = self.parse_term()?;
                left = Expr::And(Box::new(left), Box::new(right));
            } else if self.try_consume_keyword("OR") {
                self.skip_ws();
                let right = self.parse_term()?;
                left = Expr::Or(Box::new(left), Box::new(right));
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        self.skip_ws();
        if self.peek() == Some('(') {
            self.advance();
            let inner = self.parse_expr()?;
            self.skip_ws();
            self.expect(')')?;
            return Ok(inner);
        }
        if self.rest().starts_with("link(") {
            return self.parse_link();
        }
        self.parse_field()
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_alphabetic() || c == '_' => {
                self.advance();
            }
            _ => {
                return Err(Error::QueryParseError {
                    pos: self.pos,
                    reason: "expected an identifier".to_string(),
                })
            }
        }
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '.' || c == '_') {
            self.advance();
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_field(&mut self) -> Result<Expr> {
        let ident = self.parse_ident()?;
        self.skip_ws();
        self.expect(':')?;
        self.skip_ws();

        let save = self.pos;
        let op = if let Ok(word) = self.parse_bare_word_for_op() {
            self.skip_ws();
            if self.peek() == Some(':') {
                if let Some(op) = Op::from_str(&word) {
                    self.advance();
                    self.skip_ws();
                    op
                } else {
                    self.pos = save;
                    Op::Eq
                }
            } else {
                self.pos = save;
                Op::Eq
            }
        } else {
            self.pos = save;
            Op::Eq
        };

        let value = self.parse_value()?;
        Ok(Expr::Field { ident, op, value })
    }

    /// Reads a bare word (no quotes) purely to test whether it names an
    /// operator, without consuming it permanently if it doesn't.
    fn parse_bare_word_for_op(&mut self) -> Result<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        if self.pos == start {
            return Err(Error::QueryParseError {
                pos: self.pos,
                reason: "expected a word".to_string(),
            });
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.advance();
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c != q) {
                    self.advance();
                }
                let content = self.input[start..self.pos].to_string();
                self.expect(q)?;
                Ok(Value::quoted(content))
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if !c.is_whitespace() && c != ')') {
                    self.advance();
                }
                if self.pos == start {
                    return Err(Error::QueryParseError {
                        pos: self.pos,
                        reason: "expected a value".to_string(),
                    });
                }
                Ok(Value::bare(self.input[start..self.pos].to_string()))
            }
        }
    }

    fn parse_link(&mut self) -> Result<Expr> {
        self.pos += "link(".len();
        self.skip_ws();
        let conn_type = self.parse_ident()?;
        self.skip_ws();
        self.expect(',')?;
        self.skip_ws();

        let save = self.pos;
        let target = if let Ok(_ident) = self.parse_ident() {
            self.skip_ws();
            if self.peek() == Some(':') {
                self.pos = save;
                let field = self.parse_field()?;
                TargetSpec::SubQuery(Box::new(field))
            } else {
                self.pos = save;
                TargetSpec::Literal(self.parse_value()?.raw)
            }
        } else {
            self.pos = save;
            TargetSpec::Literal(self.parse_value()?.raw)
        };

        self.skip_ws();
        self.expect(')')?;
        Ok(Expr::Link { conn_type, target })
    }
}

/// Renders a condition tree back to the grammar's surface syntax. Only the
/// right-hand child of a binary node needs parentheses: the grammar's
/// `Expr := Term (('AND'|'OR') Term)*` production already flattens a
/// left-hand chain without them.
pub fn serialize(expr: &Expr) -> String {
    match expr {
        Expr::Field { ident, op, value } => {
            let val = render_value(value);
            if *op == Op::Eq {
                format!("{ident}:{val}")
            } else {
                format!("{ident}:{}:{val}", op.as_str())
            }
        }
        Expr::Link { conn_type, target } => {
            let target_str = match target {
                TargetSpec::Literal(id) => id.clone(),
                TargetSpec::SubQuery(expr) => serialize(expr),
            };
            format!("link({conn_type}, {target_str})")
        }
        Expr::And(l, r) => format!("{} AND {}", serialize(l), serialize_right(r)),
        Expr::Or(l, r) => format!("{} OR {}", serialize(l), serialize_right(r)),
    }
}

fn serialize_right(expr: &Expr) -> String {
    match expr {
        Expr::And(..) | Expr::Or(..) => format!("({})", serialize(expr)),
        other => serialize(other),
    }
}

fn render_value(value: &Value) -> String {
    if value.quoted || value.raw.is_empty() || value.raw.chars().any(char::is_whitespace) {
        format!("\"{}\"", value.raw)
    } else {
        value.raw.clone()
    }
}
