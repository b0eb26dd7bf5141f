//! cortex-query — the structured query language, state machine, structural
//! validator, and multi-mode query engine.
//!
//! This crate sits directly below `cortex-sync`: it's given already-built
//! indices (a `Graph`, a `Bm25Index`, a `VectorIndex`, an
//! `EmbeddingProvider`) and a node collection, and answers queries against
//! them. It never builds or persists an index itself — that's the Index
//! Engine's job (`cortex-sync`).

mod ast;
mod engine;
mod eval;
mod parser;
mod state_machine;
mod validator;

pub use ast::{Expr, Op, TargetSpec, Value};
pub use engine::{QueryConfig, QueryEngine};
pub use eval::{evaluate, EvalCtx};
pub use parser::{is_structured, parse, serialize};
pub use state_machine::{is_legal, validate_transition};
pub use validator::{validate_body, validate_collection, validate_node, validate_priority, validate_unique_ids};
