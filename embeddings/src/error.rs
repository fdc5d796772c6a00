use thiserror::Error;

/// Errors that can occur while vectorizing text
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    #[error("Failed to initialize embedding model: {0}")]
    ModelInitialization(String),

    /// Failed to generate embeddings
    #[error("Failed to generate embeddings: {0}")]
    EmbeddingGeneration(String),

    /// Invalid input provided to the provider
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider returned a different number of vectors than texts submitted
    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

#[cfg(feature = "fastembed")]
impl From<fastembed::Error> for EmbeddingError {
    fn from(err: fastembed::Error) -> Self {
        EmbeddingError::EmbeddingGeneration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;
