use crate::error::{EmbeddingError, Result};
use crate::provider::EmbeddingProvider;
use crate::vector::Embedding;
use crate::DEFAULT_SHINGLE_SIZE;
use std::collections::BTreeMap;

/// Character-shingle frequency vectorizer.
///
/// Lowercases the input and counts every window of `size` consecutive
/// characters. Texts shorter than the window produce a single feature made of
/// the whole text. This is a lexical stand-in for a learned embedding model:
/// it catches sub-word overlap ("cat" / "cats") but has no notion of meaning.
#[derive(Debug, Clone)]
pub struct ShingleEmbedder {
    size: usize,
}

impl ShingleEmbedder {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(EmbeddingError::InvalidInput(
                "shingle size must be > 0".to_string(),
            ));
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for ShingleEmbedder {
    fn default() -> Self {
        Self {
            size: DEFAULT_SHINGLE_SIZE,
        }
    }
}

impl EmbeddingProvider for ShingleEmbedder {
    fn name(&self) -> &str {
        "char-shingle"
    }

    fn embed(&self, text: &str) -> Result<Embedding> {
        let chars: Vec<char> = text.trim().to_lowercase().chars().collect();
        let mut features: BTreeMap<String, f32> = BTreeMap::new();

        if chars.is_empty() {
            return Ok(Embedding::Sparse(features));
        }

        if chars.len() < self.size {
            features.insert(chars.iter().collect(), 1.0);
            return Ok(Embedding::Sparse(features));
        }

        for window in chars.windows(self.size) {
            *features.entry(window.iter().collect()).or_insert(0.0) += 1.0;
        }
        Ok(Embedding::Sparse(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::cosine_similarity;
    use pretty_assertions::assert_eq;

    fn features(embedding: &Embedding) -> &BTreeMap<String, f32> {
        match embedding {
            Embedding::Sparse(map) => map,
            Embedding::Dense(_) => panic!("shingle embedder must emit sparse vectors"),
        }
    }

    #[test]
    fn test_counts_repeated_shingles() {
        let embedder = ShingleEmbedder::new(2).unwrap();
        let embedding = embedder.embed("abab").unwrap();
        let map = features(&embedding);
        assert_eq!(map.get("ab"), Some(&2.0));
        assert_eq!(map.get("ba"), Some(&1.0));
    }

    #[test]
    fn test_lowercases_input() {
        let embedder = ShingleEmbedder::default();
        assert_eq!(
            embedder.embed("FooBar").unwrap(),
            embedder.embed("foobar").unwrap()
        );
    }

    #[test]
    fn test_short_and_empty_text() {
        let embedder = ShingleEmbedder::default();
        let short = embedder.embed("ab").unwrap();
        assert_eq!(features(&short).len(), 1);
        assert!(embedder.embed("   ").unwrap().is_empty());
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(ShingleEmbedder::new(0).is_err());
    }

    #[test]
    fn test_similar_words_overlap() {
        let embedder = ShingleEmbedder::default();
        let cat = embedder.embed("cat").unwrap();
        let cats = embedder.embed("cats").unwrap();
        let dog = embedder.embed("dog").unwrap();
        assert!(cosine_similarity(&cat, &cats) > cosine_similarity(&cat, &dog));
    }

    #[test]
    fn test_batch_preserves_order() {
        let embedder = ShingleEmbedder::default();
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let batch = embedder.embed_batch(&texts).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], embedder.embed("beta").unwrap());
    }
}
