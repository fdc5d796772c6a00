use crate::result::{DocId, FusedResult, RetrievalResult, RetrievalSource, by_score_then_id};
use log::debug;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
struct Accumulator {
    fused_score: f64,
    content: String,
    component_scores: BTreeMap<RetrievalSource, f32>,
}

/// Reciprocal Rank Fusion (RRF)
/// RRF(d) = Σ 1 / (k + rank(d))
/// where rank(d) is the 1-indexed position of d in each source list.
///
/// Returns every document seen, ordered by fused score descending with ties
/// broken by ascending id, ranked from 1. The content of the first occurrence
/// is kept; each source's original score is recorded under its tag.
pub fn reciprocal_rank_fusion(lists: &[Vec<RetrievalResult>], k: u64) -> Vec<FusedResult> {
    debug!(
        "RRF fusion over {} lists ({} entries), k = {k}",
        lists.len(),
        lists.iter().map(Vec::len).sum::<usize>()
    );

    let k = k as f64;
    let mut scores: HashMap<DocId, Accumulator> = HashMap::new();

    for list in lists {
        for (rank, result) in list.iter().enumerate() {
            let contribution = 1.0 / (k + rank as f64 + 1.0);
            let entry = scores.entry(result.id).or_insert_with(|| Accumulator {
                fused_score: 0.0,
                content: result.content.clone(),
                component_scores: BTreeMap::new(),
            });
            entry.fused_score += contribution;
            entry
                .component_scores
                .entry(result.source())
                .or_insert(result.score);
        }
    }

    let mut fused: Vec<FusedResult> = scores
        .into_iter()
        .map(|(id, acc)| FusedResult {
            id,
            content: acc.content,
            fused_score: acc.fused_score,
            component_scores: acc.component_scores,
            rank: 0,
        })
        .collect();

    fused.sort_by(|a, b| by_score_then_id((a.fused_score, a.id), (b.fused_score, b.id)));
    for (idx, result) in fused.iter_mut().enumerate() {
        result.rank = idx + 1;
    }

    debug!("RRF produced {} results", fused.len());
    fused
}
