//! # Opdex
//!
//! A semantic operation matcher: maps a free-text user request to the
//! best-fitting entry in a small fixed catalog of named automation
//! operations, using embedding similarity instead of keyword matching.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────────┐   ┌─────────────┐
//! │ Catalog  │──▶│ EmbeddingProvider  │──▶│ VectorIndex  │
//! │ (fixed)  │   │ local/ollama/openai│   │ exact L2 kNN │
//! └──────────┘   └────────────────────┘   └──────┬──────┘
//!                                                │ save/load
//!                      ┌─────────┐               ▼
//!       query ────────▶│ Matcher │         ./vector_db/
//!                      └────┬────┘
//!                           ▼
//!              ranked OperationDescriptors
//! ```
//!
//! The index is populated once from the catalog at startup (or loaded
//! from disk), then served read-only. Executing the matched operation is
//! the host's business, not this crate's.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Operation descriptors and catalog providers |
//! | [`config`] | TOML configuration parsing |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`error`] | Typed error taxonomy |
//! | [`index`] | Exact nearest-neighbor vector index with persistence |
//! | [`matcher`] | Query-to-operation matching orchestration |

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod matcher;

pub use catalog::{CatalogProvider, OperationDescriptor, StaticCatalog};
pub use embedding::EmbeddingProvider;
pub use error::{Error, Result};
pub use index::{SearchResult, VectorIndex};
pub use matcher::Matcher;
