//! Query-to-operation matching: ties the embedding provider, catalog,
//! and vector index together.
//!
//! A [`Matcher`] is constructed explicitly and shared by reference (wrap
//! it in an `Arc` at the serving seam); there is no global instance. Its
//! index is populated exactly once — either loaded from the persisted
//! directory or rebuilt from the catalog — behind a
//! [`tokio::sync::OnceCell`], so concurrent first callers wait on the
//! single population run instead of racing to add duplicate entries.
//! After that the index is read-only and searches need no locking.

use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogProvider, OperationDescriptor};
use crate::embedding::{embed_query, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::index::{VectorIndex, INDEX_FILE};

/// Matches free-text requests against the operation catalog.
pub struct Matcher {
    provider: Box<dyn EmbeddingProvider>,
    catalog: Box<dyn CatalogProvider>,
    save_dir: PathBuf,
    index: OnceCell<VectorIndex>,
}

impl Matcher {
    /// Create a matcher that persists its index under `save_dir`.
    ///
    /// No embedding work happens here; the index is built or loaded on
    /// [`initialize`](Self::initialize) or first match.
    pub fn new(
        provider: Box<dyn EmbeddingProvider>,
        catalog: Box<dyn CatalogProvider>,
        save_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            catalog,
            save_dir: save_dir.into(),
            index: OnceCell::new(),
        }
    }

    /// Encode every catalog entry and populate a fresh index in catalog
    /// order. Does not touch the persisted directory.
    pub async fn build_fresh(&self) -> Result<VectorIndex> {
        let operations = self.catalog.list_operations().to_vec();
        let mut index = VectorIndex::new(self.provider.dims());
        if operations.is_empty() {
            return Ok(index);
        }

        let texts: Vec<String> = operations.iter().map(|op| op.embedding_text()).collect();
        let embeddings = self.provider.embed(&texts).await?;
        index.add(embeddings, operations)?;
        info!(
            entries = index.len(),
            dimension = index.dimension(),
            model = self.provider.model_name(),
            "built vector index from catalog"
        );
        Ok(index)
    }

    /// Load a previously saved index from `dir`.
    ///
    /// Thin wrapper over [`VectorIndex::load`]; fails with
    /// [`Error::CorruptPersistedState`] when the directory's artifacts
    /// are missing or inconsistent.
    pub fn load_existing(dir: &Path) -> Result<VectorIndex> {
        let index = VectorIndex::load(dir)?;
        info!(
            entries = index.len(),
            dimension = index.dimension(),
            dir = %dir.display(),
            "loaded vector index"
        );
        Ok(index)
    }

    /// Build-or-load the index, exactly once per matcher.
    ///
    /// Tries [`load_existing`](Self::load_existing) when the persisted
    /// blob is present and falls back to [`build_fresh`](Self::build_fresh)
    /// (followed by a save) when it is absent or corrupt — the catalog is
    /// the source of truth and the persisted index only a cache.
    /// Idempotent: repeated and concurrent calls share one population run.
    pub async fn initialize(&self) -> Result<&VectorIndex> {
        self.index
            .get_or_try_init(|| async {
                if self.save_dir.join(INDEX_FILE).exists() {
                    match Self::load_existing(&self.save_dir) {
                        Ok(index) => return Ok(index),
                        Err(Error::CorruptPersistedState { reason, .. }) => {
                            warn!(
                                dir = %self.save_dir.display(),
                                reason = %reason,
                                "persisted index unusable, rebuilding from catalog"
                            );
                        }
                        Err(e) => return Err(e),
                    }
                }
                let index = self.build_fresh().await?;
                index.save(&self.save_dir)?;
                Ok(index)
            })
            .await
    }

    /// Return the `k` catalog entries whose descriptions best match
    /// `query`, nearest first.
    ///
    /// Zero matches (an empty catalog) yields an empty list, not an
    /// error; provider and index failures propagate. `k <= 0` is rejected
    /// before any embedding work.
    pub async fn find_matching_function(
        &self,
        query: &str,
        k: i64,
    ) -> Result<Vec<OperationDescriptor>> {
        if k <= 0 {
            return Err(Error::InvalidArgument(format!(
                "match requires k > 0, got {}",
                k
            )));
        }

        let index = self.initialize().await?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embed_query(self.provider.as_ref(), query).await?;
        let results = index.search(&query_embedding, k)?;
        debug!(query, k, hits = results.len(), "matched query");

        Ok(results.into_iter().map(|r| r.descriptor).collect())
    }

    /// Directory the index is persisted under.
    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }
}
