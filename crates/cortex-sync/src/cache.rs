//! LLM cache files: a JSON map of
//! `key -> {value|count, timestamp}` under `.activations/cache/`. TTL
//! interpretation belongs to the caller; this module only persists and
//! reloads the map. A missing file is treated as an empty cache, never an
//! error.

use cortex_error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub count: Option<u64>,
    pub timestamp: i64,
}

/// An in-memory view of one cache file, keyed by the caller's cache key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cache(IndexMap<String, CacheEntry>);

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.0.insert(key.into(), entry);
    }

    /// Loads a cache file, treating a missing file as empty.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Writes the cache back via temp-then-rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.0).map_err(|e| Error::InvalidFormat {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let tmp = path.with_extension("cache.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Ensures a cache file exists at `path`, creating an empty one if it
    /// isn't there yet (the Index Engine's "refresh the LLM cache file
    /// stubs" step). Best-effort: a write failure here is swallowed rather
    /// than aborting the whole sync.
    pub fn ensure_stub(path: &Path) -> Self {
        match Self::load(path) {
            Ok(cache) => {
                if !path.is_file() {
                    let _ = cache.save(path);
                }
                cache
            }
            Err(_) => {
                let empty = Self::new();
                let _ = empty.save(path);
                empty
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::load(&dir.path().join("summaries.cache")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache/summaries.cache");
        let mut cache = Cache::new();
        cache.insert(
            "node.1",
            CacheEntry {
                value: Some("a summary".to_string()),
                count: None,
                timestamp: 1_700_000_000,
            },
        );
        cache.save(&path).unwrap();

        let reread = Cache::load(&path).unwrap();
        assert_eq!(reread.len(), 1);
        assert_eq!(reread.get("node.1").unwrap().value.as_deref(), Some("a summary"));
    }

    #[test]
    fn ensure_stub_creates_an_empty_file_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache/tokens.cache");
        assert!(!path.is_file());
        let cache = Cache::ensure_stub(&path);
        assert!(cache.is_empty());
        assert!(path.is_file());
    }

    #[test]
    fn ensure_stub_preserves_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache/tokens.cache");
        let mut cache = Cache::new();
        cache.insert(
            "k",
            CacheEntry {
                value: None,
                count: Some(3),
                timestamp: 1,
            },
        );
        cache.save(&path).unwrap();

        let reloaded = Cache::ensure_stub(&path);
        assert_eq!(reloaded.len(), 1);
    }
}
