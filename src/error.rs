//! Error taxonomy for the matcher core.
//!
//! The index and matcher report typed errors so callers can tell a
//! programming error ([`Error::ShapeMismatch`], [`Error::DimensionMismatch`],
//! [`Error::InvalidArgument`]) from a stale on-disk cache
//! ([`Error::CorruptPersistedState`], which the startup path recovers from
//! by rebuilding) and from provider failures ([`Error::Initialization`],
//! [`Error::Embedding`]). Zero search results is never an error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the catalog, embedding, index, and matcher layers.
#[derive(Debug, Error)]
pub enum Error {
    /// The embedding provider could not be constructed. Fatal at startup;
    /// the process cannot serve without a working provider.
    #[error("embedding provider initialization failed: {0}")]
    Initialization(String),

    /// `add` was called with differing numbers of embeddings and
    /// descriptors. The index is left unchanged.
    #[error("shape mismatch on add: {embeddings} embeddings vs {descriptors} descriptors")]
    ShapeMismatch {
        embeddings: usize,
        descriptors: usize,
    },

    /// A vector did not have the index's fixed dimension.
    #[error("dimension mismatch: expected {expected} components, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A caller-supplied argument was rejected before any computation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The persisted index directory is missing an artifact, unreadable,
    /// or internally inconsistent. The catalog is the source of truth;
    /// callers should fall back to a fresh build.
    #[error("persisted index at {dir} is unusable: {reason}")]
    CorruptPersistedState { dir: PathBuf, reason: String },

    /// An embedding request failed after the provider's own retry budget
    /// was exhausted. The core never retries on top of this.
    #[error("embedding request failed: {0}")]
    Embedding(String),

    /// The catalog contained an invalid entry (e.g. a duplicate name).
    #[error("invalid catalog: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
