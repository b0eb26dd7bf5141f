//! Cortex root discovery.

use std::path::{Path, PathBuf};

/// Walks `start` and its ancestors looking for a `cortex.json` file,
/// returning the directory that contains it (the cortex root) on the first
/// match. Returns `None` if no ancestor has one.
pub fn find_cortex_root(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(d) = dir {
        if d.join("cortex.json").is_file() {
            return Some(d.to_path_buf());
        }
        dir = d.parent();
    }
    None
}

/// The conventional node directory under a cortex root.
pub fn node_dir(root: &Path) -> PathBuf {
    root.join("neuronas")
}

/// The conventional generated-artifacts directory under a cortex root,
/// safe to delete and regenerate with the next sync.
pub fn activations_dir(root: &Path) -> PathBuf {
    root.join(".activations")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_cortex_json_in_an_ancestor_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cortex.json"), "{}").unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = find_cortex_root(&nested).unwrap();
        assert_eq!(found, dir.path());
    }

    #[test]
    fn returns_none_when_no_ancestor_has_it() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_cortex_root(dir.path()).is_none());
    }

    #[test]
    fn conventional_subdirectories_have_fixed_names() {
        let root = Path::new("/root-of-cortex");
        assert_eq!(node_dir(root), root.join("neuronas"));
        assert_eq!(activations_dir(root), root.join(".activations"));
    }
}
