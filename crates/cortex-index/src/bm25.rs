//! Okapi BM25 inverted index.
//!
//! Tokenisation is deliberately naive — lowercase, split on any run of
//! non-alphanumeric characters, drop empty tokens — rather than the
//! code-aware identifier splitting a source-indexing engine might reach
//! for, because node text here is prose (titles, tags, bodies), not code.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// Splits `text` into lowercase alphanumeric tokens, discarding everything
/// else as a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Inverted-index BM25 ranker over a fixed corpus.
///
/// Documents are staged via [`Bm25Index::add_document`] and the index is
/// finalised with a one-shot [`Bm25Index::build`] that computes IDFs and
/// the corpus average document length; querying before `build` is called
/// is a logic error the caller is expected to avoid.
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    /// `doc_id -> term -> frequency`, insertion-ordered so that equal BM25
    /// scores break ties by insertion order rather than arbitrarily.
    doc_term_freq: IndexMap<String, HashMap<String, u32>>,
    doc_len: IndexMap<String, usize>,
    doc_freq: HashMap<String, usize>,
    avg_doc_len: f32,
    k1: f32,
    b: f32,
}

impl Bm25Index {
    pub fn new() -> Self {
        Self {
            k1: K1,
            b: B,
            ..Default::default()
        }
    }

    /// Overrides the default `k1`/`b` parameters.
    pub fn with_params(k1: f32, b: f32) -> Self {
        Self {
            k1,
            b,
            ..Default::default()
        }
    }

    /// Stages one document's tokenised term frequencies. Callers normally
    /// tokenise with [`tokenize`], but a caller that has already tokenised
    /// text elsewhere (e.g. the node store) can also call this directly.
    pub fn add_document(&mut self, id: impl Into<String>, text: &str) {
        let tokens = tokenize(text);
        let id = id.into();
        let mut freqs: HashMap<String, u32> = HashMap::new();
        for tok in &tokens {
            *freqs.entry(tok.clone()).or_insert(0) += 1;
        }
        self.doc_len.insert(id.clone(), tokens.len());
        self.doc_term_freq.insert(id, freqs);
    }

    /// Computes document frequencies and the corpus average document
    /// length. Must be called once after all documents are staged and
    /// before any [`Bm25Index::search`] call.
    pub fn build(&mut self) {
        self.doc_freq.clear();
        for freqs in self.doc_term_freq.values() {
            for term in freqs.keys() {
                *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
        }
        let total: usize = self.doc_len.values().sum();
        self.avg_doc_len = if self.doc_len.is_empty() {
            0.0
        } else {
            total as f32 / self.doc_len.len() as f32
        };
    }

    pub fn len(&self) -> usize {
        self.doc_term_freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_term_freq.is_empty()
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.doc_term_freq.len() as f32;
        let df = *self.doc_freq.get(term).unwrap_or(&0) as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// BM25 score of a single document against an already-tokenised query.
    /// Exposed separately from [`Bm25Index::search`] so the Query Engine's
    /// spreading-activation mode can compute an initial
    /// per-node stimulus without a full ranked scan.
    pub fn score(&self, doc_id: &str, query_terms: &[String]) -> f32 {
        let Some(freqs) = self.doc_term_freq.get(doc_id) else {
            return 0.0;
        };
        let doc_len = *self.doc_len.get(doc_id).unwrap_or(&0) as f32;
        let mut unique_terms: IndexSet<&str> = IndexSet::new();
        for t in query_terms {
            unique_terms.insert(t.as_str());
        }
        unique_terms
            .iter()
            .map(|term| {
                let tf = *freqs.get(*term).unwrap_or(&0) as f32;
                if tf == 0.0 {
                    return 0.0;
                }
                let idf = self.idf(term);
                let denom = tf + self.k1 * (1.0 - self.b + self.b * doc_len / self.avg_doc_len.max(1e-9));
                idf * (tf * (self.k1 + 1.0)) / denom
            })
            .sum()
    }

    /// Top-`k` documents for `query`, descending by score, ties broken by
    /// insertion order. Zero-score documents are omitted.
    pub fn search(&self, query: &str, k: usize) -> Vec<(String, f32)> {
        let terms = tokenize(query);
        let mut scored: Vec<(usize, String, f32)> = self
            .doc_term_freq
            .keys()
            .enumerate()
            .filter_map(|(idx, id)| {
                let s = self.score(id, &terms);
                (s > 0.0).then(|| (idx, id.clone(), s))
            })
            .collect();
        scored.sort_by(|(ia, _, sa), (ib, _, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        });
        scored.into_iter().take(k).map(|(_, id, s)| (id, s)).collect()
    }
}
