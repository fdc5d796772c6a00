use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A numeric representation of a piece of text.
///
/// Providers may emit either a dense vector (model embeddings) or a sparse
/// feature map (hashed or keyed features such as character shingles).
/// Similarity is only defined between two vectors of the same kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Embedding {
    Dense(Vec<f32>),
    Sparse(BTreeMap<String, f32>),
}

impl Embedding {
    /// True when the vector carries no non-zero component.
    pub fn is_zero(&self) -> bool {
        match self {
            Embedding::Dense(values) => values.iter().all(|v| *v == 0.0),
            Embedding::Sparse(features) => features.values().all(|v| *v == 0.0),
        }
    }

    /// Euclidean norm of the vector.
    pub fn norm(&self) -> f32 {
        let sum_sq: f32 = match self {
            Embedding::Dense(values) => values.iter().map(|v| v * v).sum(),
            Embedding::Sparse(features) => features.values().map(|v| v * v).sum(),
        };
        sum_sq.sqrt()
    }

    /// Number of stored components.
    pub fn len(&self) -> usize {
        match self {
            Embedding::Dense(values) => values.len(),
            Embedding::Sparse(features) => features.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine similarity between two embeddings.
///
/// Returns 0.0 when either vector is zero, when the kinds differ, or when two
/// dense vectors have different dimensions.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f32 {
    let dot = match (a, b) {
        (Embedding::Dense(x), Embedding::Dense(y)) => {
            if x.len() != y.len() {
                warn!(
                    "cosine similarity on mismatched dimensions ({} vs {})",
                    x.len(),
                    y.len()
                );
                return 0.0;
            }
            x.iter().zip(y.iter()).map(|(l, r)| l * r).sum::<f32>()
        }
        (Embedding::Sparse(x), Embedding::Sparse(y)) => {
            // Walk the smaller map and probe the larger one.
            let (small, large) = if x.len() <= y.len() { (x, y) } else { (y, x) };
            small
                .iter()
                .filter_map(|(key, l)| large.get(key).map(|r| l * r))
                .sum::<f32>()
        }
        _ => {
            warn!("cosine similarity between dense and sparse embeddings");
            return 0.0;
        }
    };

    let denom = a.norm() * b.norm();
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sparse(pairs: &[(&str, f32)]) -> Embedding {
        Embedding::Sparse(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
        )
    }

    #[test]
    fn test_identical_dense_vectors() {
        let v = Embedding::Dense(vec![1.0, 2.0, 3.0]);
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_sparse_vectors() {
        let a = sparse(&[("abc", 1.0)]);
        let b = sparse(&[("xyz", 2.0)]);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_partial_sparse_overlap() {
        let a = sparse(&[("ab", 1.0), ("bc", 1.0)]);
        let b = sparse(&[("bc", 1.0), ("cd", 1.0)]);
        assert!((cosine_similarity(&a, &b) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_is_not_nan() {
        let zero = Embedding::Dense(vec![0.0, 0.0]);
        let v = Embedding::Dense(vec![1.0, 0.0]);
        assert!(zero.is_zero());
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
    }

    #[test_log::test]
    fn test_kind_and_dimension_mismatch() {
        let dense = Embedding::Dense(vec![1.0, 0.0]);
        let short = Embedding::Dense(vec![1.0]);
        let sp = sparse(&[("a", 1.0)]);
        assert_eq!(cosine_similarity(&dense, &sp), 0.0);
        assert_eq!(cosine_similarity(&dense, &short), 0.0);
    }
}
