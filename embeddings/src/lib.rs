//! # Codeindex Embeddings
//!
//! Text vectorization for semantic retrieval. Retrieval code depends only on
//! the [`EmbeddingProvider`] trait, so backends can be swapped without
//! touching ranking or fusion logic.
//!
//! ## Providers
//!
//! - [`ShingleEmbedder`]: character n-gram frequency vectors. Cheap,
//!   dependency free, lexical only. Suitable for tests and as a fallback.
//! - `FastEmbedProvider` (feature `fastembed`): dense embeddings from a local
//!   ONNX model via fastembed-rs.
//!
//! ## Example
//!
//! ```
//! use codeindex_embeddings::{EmbeddingProvider, ShingleEmbedder, cosine_similarity};
//!
//! let embedder = ShingleEmbedder::default();
//! let a = embedder.embed("parse_config").unwrap();
//! let b = embedder.embed("parse_configuration").unwrap();
//! assert!(cosine_similarity(&a, &b) > 0.5);
//! ```

mod error;
#[cfg(feature = "fastembed")]
mod fastembed_provider;
mod provider;
mod shingle;
mod vector;

pub use error::{EmbeddingError, Result};
#[cfg(feature = "fastembed")]
pub use fastembed_provider::{DEFAULT_EMBEDDING_DIM, EmbeddingModelType, FastEmbedConfig, FastEmbedProvider};
pub use provider::EmbeddingProvider;
pub use shingle::ShingleEmbedder;
pub use vector::{Embedding, cosine_similarity};

/// Default character window for [`ShingleEmbedder`]
pub const DEFAULT_SHINGLE_SIZE: usize = 3;
