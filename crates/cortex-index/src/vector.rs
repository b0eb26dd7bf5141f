//! Cosine-similarity vector index and its checksummed binary persistence
//! format.

use cortex_error::{Error, Result};
use indexmap::IndexMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: [u8; 4] = *b"VECT";
const VERSION: u32 = 1;

/// Cosine similarity between two vectors given their precomputed L2 norms.
/// A zero-norm vector on either side yields `0.0` rather than dividing by
/// zero.
pub fn cosine(a: &[f32], a_norm: f32, b: &[f32], b_norm: f32) -> f32 {
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (a_norm * b_norm)
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// `doc_id -> (vector, precomputed L2 norm)`, insertion-ordered. `dim` is
/// fixed at construction — every inserted vector must match it or
/// [`Error::DimensionMismatch`] is returned.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dim: usize,
    entries: IndexMap<String, (Vec<f32>, f32)>,
}

impl VectorIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: IndexMap::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, id: impl Into<String>, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: vector.len(),
            });
        }
        let norm = l2_norm(&vector);
        self.entries.insert(id.into(), (vector, norm));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<(&[f32], f32)> {
        self.entries.get(id).map(|(v, n)| (v.as_slice(), *n))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }

    /// Cosine top-`k` against `query`, descending score, ties broken by id
    /// lexicographic order. Zero-score
    /// entries are omitted.
    pub fn cosine_top_k(&self, query: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                found: query.len(),
            });
        }
        let query_norm = l2_norm(query);
        let mut scored: Vec<(String, f32)> = self
            .entries
            .iter()
            .filter_map(|(id, (vec, norm))| {
                let s = cosine(query, query_norm, vec, *norm);
                (s > 0.0).then(|| (id.clone(), s))
            })
            .collect();
        scored.sort_by(|(ida, sa), (idb, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ida.cmp(idb))
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// Writes the index to `path` via temp-then-rename. `timestamp` is the
    /// source-tree mtime at build time, read back by the sync engine to
    /// decide whether a rebuild is needed.
    pub fn save(&self, path: &Path, timestamp: i64) -> Result<()> {
        let mut payload = Vec::new();
        for (id, (vec, _)) in &self.entries {
            let id_bytes = id.as_bytes();
            payload.extend_from_slice(&(id_bytes.len() as u16).to_le_bytes());
            payload.extend_from_slice(id_bytes);
            for f in vec {
                payload.extend_from_slice(&f.to_le_bytes());
            }
        }
        let checksum = crc32fast::hash(&payload);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("bin.tmp");
        {
            let file = File::create(&tmp)?;
            let mut w = BufWriter::new(file);
            w.write_all(&MAGIC)?;
            w.write_all(&VERSION.to_le_bytes())?;
            w.write_all(&timestamp.to_le_bytes())?;
            w.write_all(&(self.dim as u64).to_le_bytes())?;
            w.write_all(&(self.entries.len() as u64).to_le_bytes())?;
            w.write_all(&checksum.to_le_bytes())?;
            w.write_all(&0u32.to_le_bytes())?; // padding
            w.write_all(&payload)?;
            w.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Loads an index from `path`, returning it alongside the `timestamp`
    /// stored in its header. Validates magic, version, and recomputed CRC32
    /// over the payload.
    pub fn load(path: &Path) -> Result<(Self, i64)> {
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
        let timestamp = read_i64(&mut r)?;
        let dim = read_u64(&mut r)? as usize;
        let count = read_u64(&mut r)? as usize;
        let checksum = read_u32(&mut r)?;
        let _padding = read_u32(&mut r)?;

        let mut payload = Vec::new();
        r.read_to_end(&mut payload)?;
        if crc32fast::hash(&payload) != checksum {
            return Err(Error::ChecksumMismatch(path.to_path_buf()));
        }

        let mut index = VectorIndex::new(dim);
        let mut cursor = &payload[..];
        for _ in 0..count {
            let id_len = read_u16_slice(&mut cursor)? as usize;
            if cursor.len() < id_len {
                return Err(Error::ChecksumMismatch(path.to_path_buf()));
            }
            let id = String::from_utf8_lossy(&cursor[..id_len]).into_owned();
            cursor = &cursor[id_len..];
            let mut vec = Vec::with_capacity(dim);
            for _ in 0..dim {
                let mut buf = [0u8; 4];
                if cursor.len() < 4 {
                    return Err(Error::ChecksumMismatch(path.to_path_buf()));
                }
                buf.copy_from_slice(&cursor[..4]);
                cursor = &cursor[4..];
                vec.push(f32::from_le_bytes(buf));
            }
            index.insert(id, vec)?;
        }
        Ok((index, timestamp))
    }
}

fn read_u16_slice(cursor: &mut &[u8]) -> Result<u16> {
    if cursor.len() < 2 {
        return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read").into());
    }
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&cursor[..2]);
    *cursor = &cursor[2..];
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

fn read_i64(r: &mut impl Read) -> Result<i64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let a = vec![1.0, 2.0, 3.0];
        let norm = l2_norm(&a);
        assert!((cosine(&a, norm, &a, norm) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_with_zero_norm_is_zero() {
        let zero = vec![0.0, 0.0];
        let other = vec![1.0, 1.0];
        assert_eq!(cosine(&zero, 0.0, &other, l2_norm(&other)), 0.0);
    }

    #[test]
    fn dimension_mismatch_on_insert_is_an_error() {
        let mut idx = VectorIndex::new(3);
        let err = idx.insert("a", vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn round_trips_through_disk_with_matching_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".activations/vectors.bin");

        let mut idx = VectorIndex::new(3);
        idx.insert("a", vec![1.0, 0.0, 0.0]).unwrap();
        idx.insert("b", vec![0.0, 1.0, 0.0]).unwrap();
        idx.save(&path, 12345).unwrap();

        let (loaded, ts) = VectorIndex::load(&path).unwrap();
        assert_eq!(ts, 12345);
        assert_eq!(loaded.dim(), 3);
        assert_eq!(loaded.len(), 2);
        let (vec, norm) = loaded.get("a").unwrap();
        assert_eq!(vec, &[1.0, 0.0, 0.0]);
        assert_eq!(norm, 1.0);
    }

    #[test]
    fn rejects_corrupted_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.bin");
        let mut idx = VectorIndex::new(2);
        idx.insert("a", vec![1.0, 2.0]).unwrap();
        idx.save(&path, 1).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        let err = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(err, Error::ChecksumMismatch(_)));
    }

    #[test]
    fn cosine_top_k_ranks_descending_and_omits_zero_scores() {
        let mut idx = VectorIndex::new(2);
        idx.insert("close", vec![1.0, 0.0]).unwrap();
        idx.insert("far", vec![0.0, 1.0]).unwrap();
        idx.insert("mid", vec![1.0, 1.0]).unwrap();
        let results = idx.cosine_top_k(&[1.0, 0.0], 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids[0], "close");
        assert!(!ids.contains(&"far"));
    }
}
