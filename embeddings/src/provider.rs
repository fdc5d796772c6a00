use crate::error::{EmbeddingError, Result};
use crate::vector::Embedding;

/// Capability for turning text into vectors.
///
/// Implementations must be deterministic for a given input and safe to share
/// across threads; retrievers call them from blocking worker tasks.
pub trait EmbeddingProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Vectorize a single text.
    fn embed(&self, text: &str) -> Result<Embedding>;

    /// Vectorize many texts, one embedding per input in order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let embeddings = texts
            .iter()
            .map(|text| self.embed(text))
            .collect::<Result<Vec<_>>>()?;
        ensure_count(texts.len(), embeddings.len())?;
        Ok(embeddings)
    }
}

pub(crate) fn ensure_count(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(EmbeddingError::CountMismatch { expected, actual });
    }
    Ok(())
}
