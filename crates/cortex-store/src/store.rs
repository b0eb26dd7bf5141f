//! The Node Store: reads and writes node files on disk.
//!
//! Node files are addressed by id. The common case is a flat `<id>.md` file
//! directly under the store root, which gives O(1) `read`/`write` without a
//! directory walk; [`NodeStore::scan`] additionally walks the whole tree
//! recursively so a project is free to organise files into subdirectories
//! (by type, by sprint, whatever) and still have every node discovered.
//! Writes go through a temp-file-then-rename so a crash mid-write never
//! leaves a half-written node file behind.

use crate::parse::{body_offset, parse_node, validate_body};
use crate::serialize::serialize_node;
use cortex_core::Node;
use cortex_error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct NodeStore {
    root: PathBuf,
}

impl NodeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads and parses the node with the given id.
    pub fn read(&self, id: &str) -> Result<Node> {
        let path = self
            .find_path(id)
            .ok_or_else(|| Error::FileNotFound(self.root.join(format!("{id}.md"))))?;
        let text = fs::read_to_string(&path)?;
        parse_node(&path, &text)
    }

    pub fn exists(&self, id: &str) -> bool {
        self.find_path(id).is_some()
    }

    /// Serialises and writes `node`, preserving its existing file location if
    /// it already exists, or creating `<id>.md` at the store root otherwise.
    ///
    /// When `preserve_body` is `false`, the body already on disk (if any) is
    /// kept and `node.body` is ignored — a front-matter-only read-modify-write.
    /// When `true`, `node.body` is written as given.
    pub fn write(&self, node: &Node, preserve_body: bool) -> Result<()> {
        let path = self
            .find_path(&node.id)
            .unwrap_or_else(|| self.root.join(format!("{}.md", node.id)));

        let mut to_write = node.clone();
        if !preserve_body {
            if let Ok(existing_text) = fs::read_to_string(&path) {
                if let Ok(existing) = parse_node(&path, &existing_text) {
                    to_write.body = existing.body;
                }
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serialize_node(&to_write);
        write_atomic(&path, &text)
    }

    /// Rewrites a node's body only, preserving front-matter bytes verbatim.
    ///
    /// Splices `new_body` directly into the raw file bytes after the closing
    /// `---` delimiter rather than round-tripping through [`parse_node`]/
    /// [`serialize_node`], so a hand-authored front-matter block (non-
    /// canonical field order, an omitted `hash`, custom whitespace) is left
    /// untouched instead of being rewritten into this store's canonical form.
    pub fn update_body(&self, id: &str, new_body: &str) -> Result<()> {
        let path = self
            .find_path(id)
            .ok_or_else(|| Error::FileNotFound(self.root.join(format!("{id}.md"))))?;
        let text = fs::read_to_string(&path)?;
        validate_body(&path, new_body)?;
        let offset = body_offset(&text).ok_or_else(|| Error::InvalidFormat {
            path: path.clone(),
            reason: "missing `---` front-matter delimiters".to_string(),
        })?;
        let mut spliced = String::with_capacity(offset + new_body.len());
        spliced.push_str(&text[..offset]);
        spliced.push_str(new_body);
        write_atomic(&path, &spliced)
    }

    /// Parses every node file under the store root, skipping (and logging)
    /// files whose error is classified recoverable; any other error aborts
    /// the scan.
    pub fn scan(&self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for path in walk_md_files(&self.root)? {
            let text = fs::read_to_string(&path)?;
            match parse_node(&path, &text) {
                Ok(node) => nodes.push(node),
                Err(e) if e.is_recoverable_in_batch() => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable node file");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(nodes)
    }

    /// Locates a node's file by id: first the flat `<id>.md` convention,
    /// falling back to a full tree walk (by parsing every candidate's
    /// front-matter `id` field) for stores organised into subdirectories.
    pub fn find_path(&self, id: &str) -> Option<PathBuf> {
        let flat = self.root.join(format!("{id}.md"));
        if flat.is_file() {
            return Some(flat);
        }
        let candidates = walk_md_files(&self.root).ok()?;
        candidates.into_iter().find(|path| {
            fs::read_to_string(path)
                .ok()
                .and_then(|text| parse_node(path, &text).ok())
                .map(|n| n.id == id)
                .unwrap_or(false)
        })
    }

    /// The most recent modification time (Unix seconds) of any `.md` file
    /// under the store root, or `0` if the store is empty. Used by the
    /// Index Engine to decide whether the Vector Index needs a rebuild.
    pub fn latest_mtime(&self) -> Result<i64> {
        let mut latest = 0i64;
        for path in walk_md_files(&self.root)? {
            let modified = fs::metadata(&path)?.modified()?;
            let secs = modified
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            latest = latest.max(secs);
        }
        Ok(latest)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("md.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Recursively collects every `.md` file under `root`, in a deterministic
/// (lexicographically sorted) order.
fn walk_md_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    if !root.is_dir() {
        return Ok(out);
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.extension().is_some_and(|ext| ext == "md") {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}
