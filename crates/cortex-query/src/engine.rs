//! Orchestrates the five query modes over already-built indices.
//!
//! `QueryEngine` borrows everything it reads — the node collection, the
//! `Graph`, the `Bm25Index`, the `VectorIndex`, and an `EmbeddingProvider` —
//! and never mutates any of it: every query is a read-only scan or lookup.
//! Every mode returns `[(id, score)]`; hydrating full `Node` values from that
//! id set is the caller's job via `cortex-store::NodeStore`.

use crate::ast::Expr;
use crate::eval::{evaluate, EvalCtx};
use crate::parser::{is_structured, parse};
use cortex_core::Node;
use cortex_error::Result;
use cortex_graph::Graph;
use cortex_index::{cosine, tokenize, Bm25Index, EmbeddingProvider, VectorIndex};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Tunable parameters for hybrid fusion and spreading activation. Defaults
/// match the fixed constants of the original design.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryConfig {
    pub hybrid_text_weight: f32,
    pub hybrid_vector_weight: f32,
    pub activation_depth: usize,
    pub activation_decay: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            hybrid_text_weight: 0.6,
            hybrid_vector_weight: 0.4,
            activation_depth: 2,
            activation_decay: 0.7,
        }
    }
}

/// Everything `QueryEngine` needs, borrowed for the duration of one or more
/// queries. Constructed by the caller after loading indices from disk.
pub struct QueryEngine<'a> {
    nodes: &'a IndexMap<String, Node>,
    graph: &'a Graph,
    bm25: &'a Bm25Index,
    vectors: &'a VectorIndex,
    embedder: &'a EmbeddingProvider<'a>,
    config: QueryConfig,
}

impl<'a> QueryEngine<'a> {
    pub fn new(
        nodes: &'a IndexMap<String, Node>,
        graph: &'a Graph,
        bm25: &'a Bm25Index,
        vectors: &'a VectorIndex,
        embedder: &'a EmbeddingProvider<'a>,
    ) -> Self {
        Self {
            nodes,
            graph,
            bm25,
            vectors,
            embedder,
            config: QueryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    /// Single entry point that auto-detects structured vs. natural-language
    /// input and dispatches to [`Self::filter`] or [`Self::text`], so a
    /// caller holding only a raw string (e.g. a CLI flag) doesn't reimplement
    /// the detection heuristic.
    pub fn query(&self, raw: &str, limit: Option<usize>) -> Result<Vec<(String, f32)>> {
        if is_structured(raw) {
            self.filter(raw, limit)
        } else {
            Ok(self.text(raw, limit))
        }
    }

    /// `filter` mode: parses `query` into a condition tree and evaluates it
    /// against every node in scan order; every match scores `1.0` so the
    /// `(id, score)` contract stays uniform across modes.
    pub fn filter(&self, query: &str, limit: Option<usize>) -> Result<Vec<(String, f32)>> {
        let expr = parse(query)?;
        Ok(self.filter_expr(&expr, limit))
    }

    fn filter_expr(&self, expr: &Expr, limit: Option<usize>) -> Vec<(String, f32)> {
        let ctx = EvalCtx::new(self.nodes);
        let matches = self
            .nodes
            .values()
            .filter(|n| evaluate(expr, n, &ctx))
            .map(|n| (n.id.clone(), 1.0));
        match limit {
            Some(n) => matches.take(n).collect(),
            None => matches.collect(),
        }
    }

    /// `text` mode: BM25 top-k over `query`.
    pub fn text(&self, query: &str, limit: Option<usize>) -> Vec<(String, f32)> {
        self.bm25.search(query, limit.unwrap_or(self.nodes.len()))
    }

    /// `vector` mode: embeds `query` and runs cosine top-k.
    pub fn vector(&self, query: &str, limit: Option<usize>) -> Result<Vec<(String, f32)>> {
        let qvec = self.embedder.embed_text(query);
        self.vectors
            .cosine_top_k(&qvec, limit.unwrap_or(self.nodes.len()))
    }

    /// `hybrid` mode: runs `text` and `vector` independently over the full
    /// (unbounded) candidate set, min-max normalises each component within
    /// its own result set, fuses by `0.6 * text_norm + 0.4 * vector_norm`,
    /// and ranks the union.
    pub fn hybrid(&self, query: &str, limit: Option<usize>) -> Result<Vec<(String, f32)>> {
        let text_scores = self.text(query, None);
        let vector_scores = self.vector(query, None)?;

        let text_norm = min_max_normalize(&text_scores);
        let vector_norm = min_max_normalize(&vector_scores);

        let mut fused: IndexMap<String, f32> = IndexMap::new();
        for id in text_norm.keys().chain(vector_norm.keys()) {
            fused.entry(id.clone()).or_insert(0.0);
        }
        for (id, score) in fused.iter_mut() {
            let t = text_norm.get(id).copied().unwrap_or(0.0);
            let v = vector_norm.get(id).copied().unwrap_or(0.0);
            *score = self.config.hybrid_text_weight * t + self.config.hybrid_vector_weight * v;
        }

        Ok(rank(fused.into_iter().collect(), limit))
    }

    /// `activation` mode: spreading activation over the `Graph`.
    ///
    /// Initial stimulus at node `n` is
    /// `0.6 * BM25(n, query) + 0.4 * cosine(query_vec, n_vec)`; only nodes
    /// with positive stimulus enter the frontier. Propagation runs in waves:
    /// at each of `activation_depth` steps, every node activated by the
    /// *previous* step distributes `a_n * (edge_weight/100) * decay` to each
    /// forward neighbour, and that distributed amount (not the node's total
    /// accumulated activation) becomes the next step's frontier. Final rank
    /// is descending accumulated activation.
    pub fn activation(&self, query: &str, limit: Option<usize>) -> Vec<(String, f32)> {
        let terms = tokenize(query);
        let query_vec = self.embedder.embed_text(query);
        let query_norm = l2_norm(&query_vec);

        let mut activation: HashMap<String, f32> = HashMap::new();
        for id in self.nodes.keys() {
            let bm25_score = self.bm25.score(id, &terms);
            let vector_score = self
                .vectors
                .get(id)
                .map(|(vec, norm)| cosine(&query_vec, query_norm, vec, norm))
                .unwrap_or(0.0);
            let stimulus =
                self.config.hybrid_text_weight * bm25_score + self.config.hybrid_vector_weight * vector_score;
            if stimulus > 0.0 {
                activation.insert(id.clone(), stimulus);
            }
        }

        let mut frontier: Vec<(String, f32)> = activation.iter().map(|(k, v)| (k.clone(), *v)).collect();
        for _ in 0..self.config.activation_depth {
            let mut next_frontier: HashMap<String, f32> = HashMap::new();
            for (node, a) in &frontier {
                for (neighbor, weight) in self.graph.get_adjacent(node) {
                    let delta = a * (*weight as f32 / 100.0) * self.config.activation_decay;
                    *next_frontier.entry(neighbor.clone()).or_insert(0.0) += delta;
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            for (id, delta) in &next_frontier {
                *activation.entry(id.clone()).or_insert(0.0) += delta;
            }
            frontier = next_frontier.into_iter().collect();
        }

        rank(activation.into_iter().collect(), limit)
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Min-max normalises a ranked result set to `[0.0, 1.0]`. A set with one
/// element (or where every score is equal) normalises every entry to `1.0`
/// rather than dividing by a zero range. An empty set stays empty.
fn min_max_normalize(scores: &[(String, f32)]) -> HashMap<String, f32> {
    if scores.is_empty() {
        return HashMap::new();
    }
    let min = scores.iter().map(|(_, s)| *s).fold(f32::INFINITY, f32::min);
    let max = scores.iter().map(|(_, s)| *s).fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    scores
        .iter()
        .map(|(id, s)| {
            let norm = if range <= 0.0 { 1.0 } else { (s - min) / range };
            (id.clone(), norm)
        })
        .collect()
}

/// Sorts `scored` descending by score, ties broken id-lexicographically,
/// then applies `limit`.
fn rank(mut scored: Vec<(String, f32)>, limit: Option<usize>) -> Vec<(String, f32)> {
    scored.sort_by(|(ida, sa), (idb, sb)| {
        sb.partial_cmp(sa).unwrap_or(Ordering::Equal).then_with(|| ida.cmp(idb))
    });
    if let Some(n) = limit {
        scored.truncate(n);
    }
    scored
}
