use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Position of a document in the corpus supplied to one retrieval call.
///
/// Not stable across calls or corpus reorderings.
pub type DocId = usize;

/// Retriever that produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalSource {
    /// BM25 term statistics
    Lexical,
    /// Embedding cosine similarity
    Semantic,
    /// Term co-occurrence graph
    Relational,
}

impl RetrievalSource {
    pub const ALL: [RetrievalSource; 3] = [
        RetrievalSource::Lexical,
        RetrievalSource::Semantic,
        RetrievalSource::Relational,
    ];
}

/// Source-specific explanation attached to a result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SourceDetail {
    /// Un-normalized BM25 score
    Lexical { raw_score: f32 },
    /// Cosine similarity between query and document vectors
    Semantic { similarity: f32 },
    /// Graph hops needed to reach the matching terms (0 = literal match)
    Relational { hops: usize },
}

/// A single result from one retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub id: DocId,

    pub content: String,

    /// Relevance on the producing source's own scale, in [0, 1]
    pub score: f32,

    pub detail: SourceDetail,
}

impl RetrievalResult {
    pub fn source(&self) -> RetrievalSource {
        match self.detail {
            SourceDetail::Lexical { .. } => RetrievalSource::Lexical,
            SourceDetail::Semantic { .. } => RetrievalSource::Semantic,
            SourceDetail::Relational { .. } => RetrievalSource::Relational,
        }
    }
}

/// A result after Reciprocal Rank Fusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub id: DocId,

    pub content: String,

    /// Sum of RRF contributions across sources
    pub fused_score: f64,

    /// Original score from every source that returned this document
    pub component_scores: BTreeMap<RetrievalSource, f32>,

    /// 1-indexed position in the fused list
    pub rank: usize,
}

/// Statistics for one retrieval call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionMetrics {
    pub lexical_count: usize,

    pub semantic_count: usize,

    pub relational_count: usize,

    /// Wall-clock time of the whole call in milliseconds
    pub fusion_time_ms: u64,

    /// Distinct documents seen across all sources before truncation
    pub candidate_count: usize,
}

impl FusionMetrics {
    pub fn count(&self, source: RetrievalSource) -> usize {
        match source {
            RetrievalSource::Lexical => self.lexical_count,
            RetrievalSource::Semantic => self.semantic_count,
            RetrievalSource::Relational => self.relational_count,
        }
    }

    pub(crate) fn set_count(&mut self, source: RetrievalSource, count: usize) {
        match source {
            RetrievalSource::Lexical => self.lexical_count = count,
            RetrievalSource::Semantic => self.semantic_count = count,
            RetrievalSource::Relational => self.relational_count = count,
        }
    }
}

/// Output of a retrieval call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub results: Vec<FusedResult>,
    pub metrics: FusionMetrics,
}

impl RetrieveResponse {
    /// Get top N results
    pub fn top(&self, n: usize) -> &[FusedResult] {
        &self.results[..n.min(self.results.len())]
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }
}

/// Score descending, then id ascending.
pub(crate) fn by_score_then_id(a: (f64, DocId), b: (f64, DocId)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1))
}

/// Sort a single retriever's output and cut it to `limit`.
pub(crate) fn rank_and_truncate(results: &mut Vec<RetrievalResult>, limit: usize) {
    results.sort_by(|a, b| by_score_then_id((a.score as f64, a.id), (b.score as f64, b.id)));
    results.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lexical(id: DocId, score: f32) -> RetrievalResult {
        RetrievalResult {
            id,
            content: format!("doc {id}"),
            score,
            detail: SourceDetail::Lexical { raw_score: score * 3.0 },
        }
    }

    #[test]
    fn test_source_from_detail() {
        let result = RetrievalResult {
            id: 0,
            content: String::new(),
            score: 0.5,
            detail: SourceDetail::Relational { hops: 1 },
        };
        assert_eq!(result.source(), RetrievalSource::Relational);
        assert_eq!(lexical(1, 0.2).source(), RetrievalSource::Lexical);
    }

    #[test]
    fn test_rank_ties_break_by_id() {
        let mut results = vec![lexical(4, 0.5), lexical(2, 0.5), lexical(9, 0.9)];
        rank_and_truncate(&mut results, 2);
        let ids: Vec<DocId> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9, 2]);
    }

    #[test]
    fn test_detail_serializes_with_source_tag() {
        let json = serde_json::to_value(SourceDetail::Semantic { similarity: 0.25 }).unwrap();
        assert_eq!(json["source"], "semantic");
        assert_eq!(json["similarity"], 0.25);
    }

    #[test]
    fn test_component_scores_keyed_by_source_name() {
        let mut component_scores = BTreeMap::new();
        component_scores.insert(RetrievalSource::Lexical, 1.0);
        let fused = FusedResult {
            id: 0,
            content: "x".to_string(),
            fused_score: 0.1,
            component_scores,
            rank: 1,
        };
        let json = serde_json::to_value(&fused).unwrap();
        assert_eq!(json["component_scores"]["lexical"], 1.0);
    }

    #[test]
    fn test_response_top_clamps() {
        let response = RetrieveResponse::default();
        assert!(response.is_empty());
        assert_eq!(response.top(3).len(), 0);
    }
}
