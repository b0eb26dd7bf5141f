//! cortex-index — the two content indices that back the Query Engine's
//! `text` and `vector` modes: an Okapi BM25 inverted
//! index and a cosine-similarity vector index, plus the embedding
//! provider that turns a node (or a raw query string) into a dense vector.

mod bm25;
mod embedding;
mod vector;

pub use bm25::{tokenize, Bm25Index};
pub use embedding::{tokenize_embedding_text, EmbeddingProvider, WordVectors};
pub use vector::{cosine, VectorIndex};
