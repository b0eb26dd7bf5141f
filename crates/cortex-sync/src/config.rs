//! `cortex.json` configuration.
//!
//! Every field is optional and defaults to the fixed constant of the
//! original design, so an absent or partial `cortex.json` behaves
//! identically to it.

use serde::{Deserialize, Serialize};

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_VECTOR_DIM: usize = 64;
const DEFAULT_ACTIVATION_DEPTH: usize = 2;
const DEFAULT_ACTIVATION_DECAY: f32 = 0.7;
const DEFAULT_BM25_K1: f32 = 1.5;
const DEFAULT_BM25_B: f32 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexConfig {
    pub default_language: String,
    pub vector_dim: usize,
    pub activation_depth: usize,
    pub activation_decay: f32,
    pub bm25_k1: f32,
    pub bm25_b: f32,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            vector_dim: DEFAULT_VECTOR_DIM,
            activation_depth: DEFAULT_ACTIVATION_DEPTH,
            activation_decay: DEFAULT_ACTIVATION_DECAY,
            bm25_k1: DEFAULT_BM25_K1,
            bm25_b: DEFAULT_BM25_B,
        }
    }
}

impl CortexConfig {
    /// Reads and parses `cortex.json` at `path`. A missing file is not an
    /// error here — the caller (root discovery) decides whether that's
    /// acceptable; this just parses what's given.
    pub fn from_file(path: &std::path::Path) -> cortex_error::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| cortex_error::Error::InvalidFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_fixed_constants() {
        let cfg = CortexConfig::default();
        assert_eq!(cfg.default_language, "en");
        assert_eq!(cfg.vector_dim, 64);
        assert_eq!(cfg.activation_depth, 2);
        assert_eq!(cfg.activation_decay, 0.7);
        assert_eq!(cfg.bm25_k1, 1.5);
        assert_eq!(cfg.bm25_b, 0.75);
    }

    #[test]
    fn partial_json_fills_in_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cortex.json");
        std::fs::write(&path, r#"{"vector_dim": 128}"#).unwrap();
        let cfg = CortexConfig::from_file(&path).unwrap();
        assert_eq!(cfg.vector_dim, 128);
        assert_eq!(cfg.bm25_k1, 1.5);
    }

    #[test]
    fn malformed_json_is_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cortex.json");
        std::fs::write(&path, "not json").unwrap();
        let err = CortexConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, cortex_error::Error::InvalidFormat { .. }));
    }
}
