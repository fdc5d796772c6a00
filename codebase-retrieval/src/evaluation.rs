//! Retrieval quality metrics against ground-truth relevance judgments.
//!
//! - Precision@k, Recall@k, F1@k
//! - Reciprocal rank (MRR when averaged over queries)
//!
//! All functions return 0.0 instead of NaN when `k == 0` or no document is
//! relevant.

use crate::result::{DocId, FusedResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Cutoffs reported by [`QueryMetrics::compute`]
pub const STANDARD_CUTOFFS: [usize; 4] = [1, 3, 5, 10];

/// Relevance of one document to a query (0 = not relevant)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceJudgment {
    pub id: DocId,
    pub relevance: u8,
}

impl RelevanceJudgment {
    pub fn new(id: DocId, relevance: u8) -> Self {
        Self { id, relevance }
    }

    /// Binary relevant judgment
    pub fn relevant(id: DocId) -> Self {
        Self::new(id, 1)
    }

    pub fn is_relevant(&self) -> bool {
        self.relevance > 0
    }
}

fn relevant_ids(judgments: &[RelevanceJudgment]) -> BTreeSet<DocId> {
    judgments
        .iter()
        .filter(|j| j.is_relevant())
        .map(|j| j.id)
        .collect()
}

fn hits_at_k(results: &[FusedResult], relevant: &BTreeSet<DocId>, k: usize) -> usize {
    results
        .iter()
        .take(k)
        .filter(|r| relevant.contains(&r.id))
        .count()
}

/// Fraction of the top `k` results that are relevant.
///
/// The denominator is `k`, not the number of results returned.
pub fn precision_at_k(results: &[FusedResult], judgments: &[RelevanceJudgment], k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let relevant = relevant_ids(judgments);
    hits_at_k(results, &relevant, k) as f64 / k as f64
}

/// Fraction of all relevant documents found in the top `k` results.
pub fn recall_at_k(results: &[FusedResult], judgments: &[RelevanceJudgment], k: usize) -> f64 {
    let relevant = relevant_ids(judgments);
    if k == 0 || relevant.is_empty() {
        return 0.0;
    }
    hits_at_k(results, &relevant, k) as f64 / relevant.len() as f64
}

/// Harmonic mean of precision@k and recall@k.
pub fn f1_at_k(results: &[FusedResult], judgments: &[RelevanceJudgment], k: usize) -> f64 {
    let precision = precision_at_k(results, judgments, k);
    let recall = recall_at_k(results, judgments, k);
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// 1 / position of the first relevant result, or 0.0 if none.
pub fn reciprocal_rank(results: &[FusedResult], judgments: &[RelevanceJudgment]) -> f64 {
    let relevant = relevant_ids(judgments);
    results
        .iter()
        .position(|r| relevant.contains(&r.id))
        .map(|idx| 1.0 / (idx + 1) as f64)
        .unwrap_or(0.0)
}

/// Metrics for a single query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetrics {
    pub precision_at_k: BTreeMap<usize, f64>,
    pub recall_at_k: BTreeMap<usize, f64>,
    pub f1_at_k: BTreeMap<usize, f64>,
    pub reciprocal_rank: f64,
}

impl QueryMetrics {
    /// Compute all metrics at [`STANDARD_CUTOFFS`].
    pub fn compute(results: &[FusedResult], judgments: &[RelevanceJudgment]) -> Self {
        let mut metrics = Self {
            reciprocal_rank: reciprocal_rank(results, judgments),
            ..Default::default()
        };
        for k in STANDARD_CUTOFFS {
            metrics
                .precision_at_k
                .insert(k, precision_at_k(results, judgments, k));
            metrics
                .recall_at_k
                .insert(k, recall_at_k(results, judgments, k));
            metrics.f1_at_k.insert(k, f1_at_k(results, judgments, k));
        }
        metrics
    }
}

/// Average per-query metrics; the averaged reciprocal rank is the MRR.
pub fn mean_metrics(per_query: &[QueryMetrics]) -> QueryMetrics {
    if per_query.is_empty() {
        return QueryMetrics::default();
    }
    let n = per_query.len() as f64;

    QueryMetrics {
        precision_at_k: average(per_query.iter().map(|m| &m.precision_at_k), n),
        recall_at_k: average(per_query.iter().map(|m| &m.recall_at_k), n),
        f1_at_k: average(per_query.iter().map(|m| &m.f1_at_k), n),
        reciprocal_rank: per_query.iter().map(|m| m.reciprocal_rank).sum::<f64>() / n,
    }
}

fn average<'a>(
    maps: impl Iterator<Item = &'a BTreeMap<usize, f64>>,
    n: f64,
) -> BTreeMap<usize, f64> {
    let mut sums: BTreeMap<usize, f64> = BTreeMap::new();
    for map in maps {
        for (k, value) in map {
            *sums.entry(*k).or_insert(0.0) += value;
        }
    }
    sums.into_iter().map(|(k, sum)| (k, sum / n)).collect()
}
