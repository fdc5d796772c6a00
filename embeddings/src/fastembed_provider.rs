use crate::error::{EmbeddingError, Result};
use crate::provider::{EmbeddingProvider, ensure_count};
use crate::vector::Embedding;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Default embedding dimension for Nomic-embed-text-v1.5
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Configuration for the fastembed-backed provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastEmbedConfig {
    /// Model to use for embeddings
    pub model: EmbeddingModelType,

    /// Target embedding dimension (Matryoshka truncation)
    pub dimension: usize,

    /// Maximum batch size for embedding generation
    pub batch_size: usize,

    /// Show download progress when downloading models
    pub show_download_progress: bool,
}

impl Default for FastEmbedConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModelType::NomicEmbedTextV15,
            dimension: DEFAULT_EMBEDDING_DIM,
            batch_size: 32,
            show_download_progress: false,
        }
    }
}

/// Supported embedding models
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum EmbeddingModelType {
    /// Nomic-embed-text-v1.5 (recommended for code)
    NomicEmbedTextV15,
    /// All-MiniLM-L6-v2 (lightweight, faster)
    AllMiniLmL6V2,
}

impl EmbeddingModelType {
    fn to_fastembed_model(self) -> EmbeddingModel {
        match self {
            EmbeddingModelType::NomicEmbedTextV15 => EmbeddingModel::NomicEmbedTextV15,
            EmbeddingModelType::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
        }
    }
}

/// Dense embedding provider backed by a local ONNX model
pub struct FastEmbedProvider {
    model: TextEmbedding,
    config: FastEmbedConfig,
}

impl FastEmbedProvider {
    pub fn new(config: FastEmbedConfig) -> Result<Self> {
        info!(
            "Initializing fastembed provider with model {:?}, dimension {}",
            config.model, config.dimension
        );
        if config.batch_size == 0 {
            return Err(EmbeddingError::InvalidInput(
                "batch_size must be > 0".to_string(),
            ));
        }

        let init_options = InitOptions::new(config.model.to_fastembed_model())
            .with_show_download_progress(config.show_download_progress);
        let model = TextEmbedding::try_new(init_options)
            .map_err(|e| EmbeddingError::ModelInitialization(e.to_string()))?;

        Ok(Self { model, config })
    }

    pub fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn truncate(&self, mut embedding: Vec<f32>) -> Embedding {
        if embedding.len() > self.config.dimension {
            embedding.truncate(self.config.dimension);
        }
        Embedding::Dense(embedding)
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn name(&self) -> &str {
        "fastembed"
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EmbeddingError::EmbeddingGeneration("No embedding generated".into()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Generating embeddings for {} texts", texts.len());

        let mut all = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            let vectors = self.model.embed(refs, None)?;
            all.extend(vectors.into_iter().map(|v| self.truncate(v)));
        }
        ensure_count(texts.len(), all.len())?;
        Ok(all)
    }
}
