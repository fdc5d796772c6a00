use thiserror::Error;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] codeindex_embeddings::EmbeddingError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    #[error("Retrieval cancelled")]
    Cancelled,

    #[error("Retriever task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, RetrievalError>;
