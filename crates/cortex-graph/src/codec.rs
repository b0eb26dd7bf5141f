//! The Graph Index Codec: a checksum-free, magic+version-gated binary
//! format for persisting a [`Graph`]. Unlike the Vector
//! Index, the graph codec relies on `version`/`magic` gating rather than a
//! CRC — corruption here is caught the same way a bad version is: the next
//! sync just rebuilds it from the node files, which are the source of truth.

use crate::adjacency::Graph;
use cortex_error::{Error, Result};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: [u8; 4] = *b"ENGI";
const VERSION: u32 = 1;

/// Writes `graph` to `path` via a temp-file-then-rename, creating the
/// parent directory if it doesn't exist yet.
pub fn save(graph: &Graph, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("idx.tmp");
    {
        let file = File::create(&tmp)?;
        let mut w = BufWriter::new(file);
        w.write_all(&MAGIC)?;
        w.write_all(&VERSION.to_le_bytes())?;
        w.write_all(&(graph.node_count() as u64).to_le_bytes())?;
        w.write_all(&(graph.edge_count() as u64).to_le_bytes())?;

        for (id, edges) in graph.forward_entries() {
            write_str(&mut w, id)?;
            w.write_all(&(edges.len() as u32).to_le_bytes())?;
            for (target, weight) in edges {
                write_str(&mut w, target)?;
                w.write_all(&[*weight])?;
            }
        }
        w.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a graph from `path`. Reverse adjacency is rebuilt from the forward
/// edges read here, never read from disk.
pub fn load(path: &Path) -> Result<Graph> {
    let file = File::open(path)?;
    let mut r = BufReader::new(file);

    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Error::InvalidMagic {
            expected: MAGIC,
            found: magic,
        });
    }

    let version = read_u32(&mut r)?;
    if version > VERSION {
        return Err(Error::UnsupportedVersion {
            found: version,
            max: VERSION,
        });
    }

    let node_count = read_u64(&mut r)?;
    let _edge_count = read_u64(&mut r)?;

    let mut graph = Graph::new();
    for _ in 0..node_count {
        let id = read_str(&mut r)?;
        graph.ensure_node(&id);
        let out_degree = read_u32(&mut r)?;
        for _ in 0..out_degree {
            let target = read_str(&mut r)?;
            let mut weight_buf = [0u8; 1];
            r.read_exact(&mut weight_buf)?;
            graph.add_edge(&id, &target, weight_buf[0]);
        }
    }

    Ok(graph)
}

fn write_str(w: &mut impl Write, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    w.write_all(&(bytes.len() as u16).to_le_bytes())?;
    w.write_all(bytes)?;
    Ok(())
}

fn read_str(r: &mut impl Read) -> Result<String> {
    let len = read_u16(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn read_u16(r: &mut impl Read) -> Result<u16> {
    let mut buf = [0u8; 2];
    r.read_exact(&mut buf)?;
    Ok(u16::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(r: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".activations/graph.idx");

        let mut graph = Graph::new();
        graph.add_edge("a", "b", 90);
        graph.add_edge("a", "c", 10);
        graph.ensure_node("isolated");

        save(&graph, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.node_count(), graph.node_count());
        assert_eq!(loaded.edge_count(), graph.edge_count());
        assert!(loaded.has_node("isolated"));
        assert_eq!(loaded.get_adjacent("a").len(), 2);
        assert!(loaded.has_edge("a", "b"));
    }

    #[test]
    fn rejects_mismatched_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.idx");
        fs::write(&path, b"XXXX\x01\x00\x00\x00").unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic { .. }));
    }

    #[test]
    fn rejects_newer_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.idx");
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        fs::write(&path, bytes).unwrap();
        let err = load(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion { .. }));
    }

    #[test]
    fn creates_parent_directory_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/graph.idx");
        save(&Graph::new(), &path).unwrap();
        assert!(path.is_file());
    }
}
