//! Exact nearest-neighbor index over operation embeddings.
//!
//! The catalog holds tens of entries, so search is deliberately exact
//! brute-force squared-L2 over every stored vector; the ordering and
//! tie-break contract is easy to state and cheap to honor at this size.
//! The index is append-only: entries are never removed or modified, and
//! insertion order is the stable handle order used for tie-breaking.
//!
//! # Persisted layout
//!
//! `save` writes three co-located artifacts into a directory:
//!
//! ```text
//! index.bin       # OPDX magic, version, dimension, count, LE f32 vectors
//! metadata.json   # array of OperationDescriptor, aligned 1:1 with vectors
//! config.json     # { "dimension": D }
//! ```
//!
//! `load` reconstructs the index from the directory alone and reports
//! [`Error::CorruptPersistedState`] on any missing, unreadable, or
//! mutually inconsistent artifact. Callers treat the persisted index as a
//! cache and rebuild from the catalog on that error.

use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use crate::catalog::OperationDescriptor;
use crate::error::{Error, Result};

/// File name of the serialized vector blob.
pub const INDEX_FILE: &str = "index.bin";
/// File name of the descriptor array.
pub const METADATA_FILE: &str = "metadata.json";
/// File name of the dimension record.
pub const CONFIG_FILE: &str = "config.json";

const MAGIC: [u8; 4] = *b"OPDX";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// One search hit: a catalog entry and its squared-L2 distance from the
/// query. Results are ordered ascending by distance, nearest first.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub descriptor: OperationDescriptor,
    pub distance: f32,
}

/// Append-only store of fixed-dimension embeddings paired with the
/// descriptors they represent.
///
/// Invariant: `vectors.len() == descriptors.len()` at all times, and
/// every vector has exactly `dimension` components.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    descriptors: Vec<OperationDescriptor>,
}

#[derive(Deserialize)]
struct IndexConfig {
    dimension: usize,
}

impl VectorIndex {
    /// Create an empty index accepting vectors of `dimension` components.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            descriptors: Vec::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append embeddings and their descriptors in lockstep order.
    ///
    /// All-or-nothing: both slices are validated in full before the index
    /// is touched, so a failed call leaves the index unchanged. Fails with
    /// [`Error::ShapeMismatch`] when the lengths differ and
    /// [`Error::DimensionMismatch`] when any vector is not
    /// `self.dimension` long.
    pub fn add(
        &mut self,
        embeddings: Vec<Vec<f32>>,
        descriptors: Vec<OperationDescriptor>,
    ) -> Result<()> {
        if embeddings.len() != descriptors.len() {
            return Err(Error::ShapeMismatch {
                embeddings: embeddings.len(),
                descriptors: descriptors.len(),
            });
        }
        for v in &embeddings {
            if v.len() != self.dimension {
                return Err(Error::DimensionMismatch {
                    expected: self.dimension,
                    actual: v.len(),
                });
            }
        }
        self.vectors.extend(embeddings);
        self.descriptors.extend(descriptors);
        Ok(())
    }

    /// Return the `k` entries nearest to `query` by squared L2 distance,
    /// ascending. Equal distances keep insertion order (lower handle
    /// first). An empty index yields an empty result; `k <= 0` fails with
    /// [`Error::InvalidArgument`] before any computation.
    pub fn search(&self, query: &[f32], k: i64) -> Result<Vec<SearchResult>> {
        if k <= 0 {
            return Err(Error::InvalidArgument(format!(
                "search requires k > 0, got {}",
                k
            )));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(handle, v)| (handle, squared_l2(query, v)))
            .collect();
        // Stable sort: ties stay in handle order.
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k as usize);

        Ok(hits
            .into_iter()
            .map(|(handle, distance)| SearchResult {
                descriptor: self.descriptors[handle].clone(),
                distance,
            })
            .collect())
    }

    /// Write the three persistence artifacts into `dir`, creating the
    /// directory if needed. A saved index loads back losslessly.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let mut blob = Vec::with_capacity(HEADER_LEN + self.len() * self.dimension * 4);
        blob.extend_from_slice(&MAGIC);
        blob.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        blob.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        blob.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for v in &self.vectors {
            for &x in v {
                blob.extend_from_slice(&x.to_le_bytes());
            }
        }
        std::fs::write(dir.join(INDEX_FILE), blob)?;

        let metadata = serde_json::to_vec_pretty(&self.descriptors)?;
        std::fs::write(dir.join(METADATA_FILE), metadata)?;

        let config = serde_json::to_vec_pretty(&json!({ "dimension": self.dimension }))?;
        std::fs::write(dir.join(CONFIG_FILE), config)?;

        Ok(())
    }

    /// Reconstruct an index from a directory written by [`save`](Self::save).
    ///
    /// Fails with [`Error::CorruptPersistedState`] if any artifact is
    /// missing or unreadable, if the vector blob and descriptor array
    /// disagree on length, or if `config.json` disagrees with the blob's
    /// recorded dimension.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_raw = read_artifact(dir, CONFIG_FILE)?;
        let config: IndexConfig = serde_json::from_slice(&config_raw)
            .map_err(|e| corrupt(dir, format!("{}: {}", CONFIG_FILE, e)))?;

        let metadata_raw = read_artifact(dir, METADATA_FILE)?;
        let descriptors: Vec<OperationDescriptor> = serde_json::from_slice(&metadata_raw)
            .map_err(|e| corrupt(dir, format!("{}: {}", METADATA_FILE, e)))?;

        let blob = read_artifact(dir, INDEX_FILE)?;
        let (dimension, vectors) = decode_blob(dir, &blob)?;

        if dimension != config.dimension {
            return Err(corrupt(
                dir,
                format!(
                    "{} records dimension {} but {} contains {}-dimensional vectors",
                    CONFIG_FILE, config.dimension, INDEX_FILE, dimension
                ),
            ));
        }
        if descriptors.len() != vectors.len() {
            return Err(corrupt(
                dir,
                format!(
                    "{} holds {} entries but {} holds {} vectors",
                    METADATA_FILE,
                    descriptors.len(),
                    INDEX_FILE,
                    vectors.len()
                ),
            ));
        }

        Ok(Self {
            dimension,
            vectors,
            descriptors,
        })
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn corrupt(dir: &Path, reason: String) -> Error {
    Error::CorruptPersistedState {
        dir: dir.to_path_buf(),
        reason,
    }
}

fn read_artifact(dir: &Path, name: &str) -> Result<Vec<u8>> {
    std::fs::read(dir.join(name)).map_err(|e| corrupt(dir, format!("{}: {}", name, e)))
}

/// Decode the `index.bin` blob: header check, then `count` vectors of
/// `dimension` little-endian f32 values in insertion order.
fn decode_blob(dir: &Path, blob: &[u8]) -> Result<(usize, Vec<Vec<f32>>)> {
    if blob.len() < HEADER_LEN {
        return Err(corrupt(
            dir,
            format!("{}: truncated header ({} bytes)", INDEX_FILE, blob.len()),
        ));
    }
    if blob[0..4] != MAGIC {
        return Err(corrupt(dir, format!("{}: bad magic", INDEX_FILE)));
    }
    let version = u32::from_le_bytes([blob[4], blob[5], blob[6], blob[7]]);
    if version != FORMAT_VERSION {
        return Err(corrupt(
            dir,
            format!("{}: unsupported format version {}", INDEX_FILE, version),
        ));
    }
    let dimension = u32::from_le_bytes([blob[8], blob[9], blob[10], blob[11]]) as usize;
    let count = u64::from_le_bytes([
        blob[12], blob[13], blob[14], blob[15], blob[16], blob[17], blob[18], blob[19],
    ]) as usize;

    let body = &blob[HEADER_LEN..];
    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt(dir, format!("{}: header overflow", INDEX_FILE)))?;
    if body.len() != expected {
        return Err(corrupt(
            dir,
            format!(
                "{}: expected {} vector bytes, found {}",
                INDEX_FILE,
                expected,
                body.len()
            ),
        ));
    }

    let vectors = if dimension == 0 {
        vec![Vec::new(); count]
    } else {
        let floats: Vec<f32> = body
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        floats.chunks(dimension).map(|c| c.to_vec()).collect()
    };

    Ok((dimension, vectors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn desc(name: &str) -> OperationDescriptor {
        OperationDescriptor {
            name: name.to_string(),
            description: format!("{} description", name),
            keywords: vec![name.to_string()],
            category: "test".to_string(),
            parameters: Vec::new(),
        }
    }

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new(2);
        index
            .add(
                vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 2.0]],
                vec![desc("origin"), desc("unit_x"), desc("far_y")],
            )
            .unwrap();
        index
    }

    #[test]
    fn test_search_orders_by_distance() {
        let index = sample_index();
        let results = index.search(&[0.9, 0.0], 3).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.descriptor.name.as_str()).collect();
        assert_eq!(names, vec!["unit_x", "origin", "far_y"]);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let index = sample_index();
        let results = index.search(&[0.0, 0.0], 10).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_search_returns_each_entry_once() {
        let index = sample_index();
        let results = index.search(&[0.5, 0.5], 3).unwrap();
        let mut names: Vec<&str> = results.iter().map(|r| r.descriptor.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["far_y", "origin", "unit_x"]);
    }

    #[test]
    fn test_search_ties_keep_insertion_order() {
        let mut index = VectorIndex::new(1);
        index
            .add(
                vec![vec![1.0], vec![-1.0], vec![1.0]],
                vec![desc("first"), desc("second"), desc("third")],
            )
            .unwrap();
        // All three are distance 1 from the origin.
        let results = index.search(&[0.0], 3).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.descriptor.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_search_empty_index() {
        let index = VectorIndex::new(4);
        let results = index.search(&[0.0; 4], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_search_rejects_non_positive_k() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[0.0, 0.0], 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            index.search(&[0.0, 0.0], -3),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_search_rejects_wrong_query_dimension() {
        let index = sample_index();
        assert!(matches!(
            index.search(&[0.0, 0.0, 0.0], 1),
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_add_shape_mismatch_leaves_index_unchanged() {
        let mut index = sample_index();
        let err = index
            .add(vec![vec![1.0, 1.0], vec![2.0, 2.0]], vec![desc("lonely")])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ShapeMismatch {
                embeddings: 2,
                descriptors: 1
            }
        ));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_add_dimension_mismatch_leaves_index_unchanged() {
        let mut index = sample_index();
        let err = index
            .add(
                vec![vec![1.0, 1.0], vec![2.0]],
                vec![desc("ok"), desc("short")],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_save_load_roundtrip_preserves_search() {
        let tmp = TempDir::new().unwrap();
        let index = sample_index();
        index.save(tmp.path()).unwrap();

        let loaded = VectorIndex::load(tmp.path()).unwrap();
        assert_eq!(loaded.dimension(), index.dimension());
        assert_eq!(loaded.len(), index.len());

        let query = [0.3, 1.7];
        let before = index.search(&query, 3).unwrap();
        let after = loaded.search(&query, 3).unwrap();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(after.iter()) {
            assert_eq!(b.descriptor, a.descriptor);
            assert!((b.distance - a.distance).abs() < 1e-6);
        }
    }

    #[test]
    fn test_load_missing_artifact() {
        let tmp = TempDir::new().unwrap();
        let index = sample_index();
        index.save(tmp.path()).unwrap();
        std::fs::remove_file(tmp.path().join(METADATA_FILE)).unwrap();

        let err = VectorIndex::load(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptPersistedState { .. }));
    }

    #[test]
    fn test_load_rejects_metadata_length_mismatch() {
        let tmp = TempDir::new().unwrap();
        let index = sample_index();
        index.save(tmp.path()).unwrap();
        std::fs::write(tmp.path().join(METADATA_FILE), b"[]").unwrap();

        let err = VectorIndex::load(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptPersistedState { .. }));
    }

    #[test]
    fn test_load_rejects_dimension_disagreement() {
        let tmp = TempDir::new().unwrap();
        let index = sample_index();
        index.save(tmp.path()).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), br#"{ "dimension": 7 }"#).unwrap();

        let err = VectorIndex::load(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptPersistedState { .. }));
    }

    #[test]
    fn test_load_rejects_garbage_blob() {
        let tmp = TempDir::new().unwrap();
        let index = sample_index();
        index.save(tmp.path()).unwrap();
        std::fs::write(tmp.path().join(INDEX_FILE), b"not an index").unwrap();

        let err = VectorIndex::load(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptPersistedState { .. }));
    }

    #[test]
    fn test_roundtrip_empty_index() {
        let tmp = TempDir::new().unwrap();
        let index = VectorIndex::new(8);
        index.save(tmp.path()).unwrap();
        let loaded = VectorIndex::load(tmp.path()).unwrap();
        assert_eq!(loaded.dimension(), 8);
        assert!(loaded.is_empty());
    }
}
