//! BM25 lexical index.
//!
//! ```text
//! score(q, d) = Σ idf(t) · tf·(k1 + 1) / (tf + k1·(1 - b + b·|d|/avgdl))
//! idf(t)      = ln((N - df + 0.5) / (df + 0.5) + 1)
//! ```
//!
//! Matching is exact-token: "cats" does not match "cat".

use crate::error::Result;
use crate::result::{DocId, RetrievalResult, RetrievalSource, SourceDetail, rank_and_truncate};
use crate::retriever::{Retriever, check_cancelled, check_cancelled_at};
use crate::tokenize::tokenize;
use log::debug;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

pub const BM25_K1: f32 = 1.2;
pub const BM25_B: f32 = 0.75;

/// BM25 tuning parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation
    pub k1: f32,
    /// Length normalization strength
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: BM25_K1,
            b: BM25_B,
        }
    }
}

/// Term statistics over one corpus
pub struct LexicalIndex<'a> {
    corpus: &'a [String],
    params: Bm25Params,
    term_freqs: Vec<HashMap<String, u32>>,
    doc_lengths: Vec<usize>,
    avg_doc_length: f32,
    doc_freqs: HashMap<String, usize>,
}

impl<'a> LexicalIndex<'a> {
    pub fn build(
        corpus: &'a [String],
        params: Bm25Params,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let mut term_freqs = Vec::with_capacity(corpus.len());
        let mut doc_lengths = Vec::with_capacity(corpus.len());
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();

        for (idx, text) in corpus.iter().enumerate() {
            check_cancelled_at(idx, cancel)?;

            let tokens = tokenize(text);
            doc_lengths.push(tokens.len());

            let mut freqs: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *freqs.entry(token).or_insert(0) += 1;
            }
            for term in freqs.keys() {
                *doc_freqs.entry(term.clone()).or_insert(0) += 1;
            }
            term_freqs.push(freqs);
        }

        let total_length: usize = doc_lengths.iter().sum();
        let avg_doc_length = if corpus.is_empty() {
            0.0
        } else {
            total_length as f32 / corpus.len() as f32
        };

        debug!(
            "Lexical index built: {} docs, {} terms, avgdl {avg_doc_length:.2}",
            corpus.len(),
            doc_freqs.len()
        );

        Ok(Self {
            corpus,
            params,
            term_freqs,
            doc_lengths,
            avg_doc_length,
            doc_freqs,
        })
    }

    pub fn len(&self) -> usize {
        self.corpus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corpus.is_empty()
    }

    pub fn avg_doc_length(&self) -> f32 {
        self.avg_doc_length
    }

    /// Number of documents containing `term`
    pub fn doc_freq(&self, term: &str) -> usize {
        self.doc_freqs.get(term).copied().unwrap_or(0)
    }

    pub fn idf(&self, term: &str) -> f32 {
        let n = self.corpus.len() as f32;
        let df = self.doc_freq(term) as f32;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    /// Raw BM25 score of one document. Absent terms contribute 0.
    pub fn score(&self, query_tokens: &[String], doc: DocId) -> f32 {
        let (Some(freqs), Some(&doc_len)) = (self.term_freqs.get(doc), self.doc_lengths.get(doc))
        else {
            return 0.0;
        };

        let length_ratio = if self.avg_doc_length > 0.0 {
            doc_len as f32 / self.avg_doc_length
        } else {
            0.0
        };
        let Bm25Params { k1, b } = self.params;

        query_tokens
            .iter()
            .filter_map(|term| freqs.get(term).map(|tf| (term, *tf as f32)))
            .map(|(term, tf)| {
                let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * length_ratio));
                self.idf(term) * tf_norm
            })
            .sum()
    }

    /// Rank every document sharing at least one term with `query`.
    ///
    /// Scores are divided by the best raw score so the top hit is 1.0.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(DocId, f32)> = Vec::new();
        for (doc, freqs) in self.term_freqs.iter().enumerate() {
            check_cancelled_at(doc, cancel)?;
            if !query_tokens.iter().any(|t| freqs.contains_key(t)) {
                continue;
            }
            let score = self.score(&query_tokens, doc);
            if score > 0.0 {
                scored.push((doc, score));
            }
        }
        check_cancelled(cancel)?;

        let max_score = scored.iter().map(|(_, s)| *s).fold(0.0_f32, f32::max);
        if max_score <= 0.0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<RetrievalResult> = scored
            .into_iter()
            .map(|(id, raw_score)| RetrievalResult {
                id,
                content: self.corpus[id].clone(),
                score: raw_score / max_score,
                detail: SourceDetail::Lexical { raw_score },
            })
            .collect();
        rank_and_truncate(&mut results, limit);

        debug!("Lexical search matched {} documents", results.len());
        Ok(results)
    }
}

/// [`Retriever`] that builds a fresh [`LexicalIndex`] per call
#[derive(Debug, Clone, Default)]
pub struct LexicalRetriever {
    params: Bm25Params,
}

impl LexicalRetriever {
    pub fn new(params: Bm25Params) -> Self {
        Self { params }
    }
}

impl Retriever for LexicalRetriever {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::Lexical
    }

    fn search(
        &self,
        query: &str,
        corpus: &[String],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>> {
        if tokenize(query).is_empty() || corpus.is_empty() {
            return Ok(Vec::new());
        }
        LexicalIndex::build(corpus, self.params, cancel)?.search(query, limit, cancel)
    }
}
