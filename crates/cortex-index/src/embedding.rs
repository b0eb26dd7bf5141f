//! The embedding provider: maps a node (or a raw query string) to a
//! dimension-`D` dense vector by mean-pooling a pre-loaded, read-only
//! word-vector table.

use cortex_core::Node;
use std::collections::HashMap;

/// A read-only table of word → vector, loaded once by the caller (e.g. from
/// a GloVe/word2vec file) and shared across embedding calls. The table's
/// format is outside this crate's scope; only the lookup contract matters.
#[derive(Debug, Clone, Default)]
pub struct WordVectors {
    dim: usize,
    table: HashMap<String, Vec<f32>>,
}

impl WordVectors {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            table: HashMap::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Inserts a word's vector, silently ignoring entries whose length
    /// doesn't match `dim` (a malformed table entry should degrade, not
    /// crash embedding for every other node).
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f32>) {
        if vector.len() == self.dim {
            self.table.insert(word.into(), vector);
        }
    }

    pub fn get(&self, word: &str) -> Option<&[f32]> {
        self.table.get(word).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Tokenises embedding input text by whitespace and common punctuation
/// — looser than BM25's tokeniser since this is prose
/// drawn from titles/tags, not a query language.
pub fn tokenize_embedding_text(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || ",.;:!?()[]{}\"'".contains(c))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Produces dense vectors for nodes and raw query strings by mean-pooling
/// looked-up word vectors.
pub struct EmbeddingProvider<'a> {
    table: &'a WordVectors,
}

impl<'a> EmbeddingProvider<'a> {
    pub fn new(table: &'a WordVectors) -> Self {
        Self { table }
    }

    pub fn dim(&self) -> usize {
        self.table.dim()
    }

    /// Node embedding text is `title + " " + space-joined tags`.
    fn embedding_text(node: &Node) -> String {
        if node.tags.is_empty() {
            node.title.clone()
        } else {
            format!("{} {}", node.title, node.tags.join(" "))
        }
    }

    /// Embeds a node: tokenise its title+tags text, look up each token,
    /// mean-pool the hits. A node with zero recognised tokens gets the zero
    /// vector, which [`crate::cosine`] maps to a similarity of `0.0`.
    pub fn embed_node(&self, node: &Node) -> Vec<f32> {
        self.embed_text(&Self::embedding_text(node))
    }

    /// Embeds arbitrary text the same way, used for the `vector` query
    /// mode's query string.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let dim = self.table.dim();
        let tokens = tokenize_embedding_text(text);
        let mut sum = vec![0.0f32; dim];
        let mut count = 0usize;
        for tok in &tokens {
            if let Some(v) = self.table.get(tok) {
                for (s, x) in sum.iter_mut().zip(v) {
                    *s += x;
                }
                count += 1;
            }
        }
        if count > 0 {
            for s in &mut sum {
                *s /= count as f32;
            }
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cortex_core::NodeType;

    fn table() -> WordVectors {
        let mut t = WordVectors::new(2);
        t.insert("auth", vec![1.0, 0.0]);
        t.insert("login", vec![0.0, 1.0]);
        t
    }

    #[test]
    fn mean_pools_recognised_tokens() {
        let t = table();
        let provider = EmbeddingProvider::new(&t);
        let v = provider.embed_text("Auth Login");
        assert_eq!(v, vec![0.5, 0.5]);
    }

    #[test]
    fn unrecognised_tokens_are_skipped_not_zero_filled() {
        let t = table();
        let provider = EmbeddingProvider::new(&t);
        let v = provider.embed_text("auth unknownword");
        assert_eq!(v, vec![1.0, 0.0]);
    }

    #[test]
    fn node_with_no_recognised_tokens_gets_zero_vector() {
        let t = table();
        let provider = EmbeddingProvider::new(&t);
        let node = Node::new("a", "Nothing Matches", NodeType::Concept);
        let v = provider.embed_node(&node);
        assert_eq!(v, vec![0.0, 0.0]);
    }

    #[test]
    fn node_embedding_text_joins_title_and_tags() {
        let mut node = Node::new("a", "Auth", NodeType::Concept);
        node.tags = vec!["login".to_string()];
        let t = table();
        let provider = EmbeddingProvider::new(&t);
        let v = provider.embed_node(&node);
        assert_eq!(v, vec![0.5, 0.5]);
    }
}
