//! Term co-occurrence graph index.
//!
//! Two terms are linked when they appear in the same document. A query is
//! expanded breadth-first across those links and documents are scored in two
//! disjoint tiers:
//!
//! - direct: `matched literal terms / query terms`
//! - expanded: `matched expanded terms / |expanded set| * 0.5`, only for
//!   documents that contain no literal query term

use crate::error::Result;
use crate::result::{DocId, RetrievalResult, RetrievalSource, SourceDetail, rank_and_truncate};
use crate::retriever::{Retriever, check_cancelled, check_cancelled_at};
use crate::tokenize::tokenize;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio_util::sync::CancellationToken;

/// Multiplier applied to expanded-tier scores
pub const EXPANSION_DISCOUNT: f32 = 0.5;

pub const DEFAULT_HOPS: usize = 1;

pub struct RelationalIndex<'a> {
    corpus: &'a [String],
    doc_terms: Vec<BTreeSet<String>>,
    postings: HashMap<String, BTreeSet<DocId>>,
    graph: HashMap<String, BTreeSet<String>>,
}

impl<'a> RelationalIndex<'a> {
    pub fn build(corpus: &'a [String], cancel: &CancellationToken) -> Result<Self> {
        let mut doc_terms = Vec::with_capacity(corpus.len());
        let mut postings: HashMap<String, BTreeSet<DocId>> = HashMap::new();
        let mut graph: HashMap<String, BTreeSet<String>> = HashMap::new();

        for (doc, text) in corpus.iter().enumerate() {
            // pairwise linking is quadratic in unique terms, so poll every document
            check_cancelled(cancel)?;

            let terms: BTreeSet<String> = tokenize(text).into_iter().collect();
            for term in &terms {
                postings.entry(term.clone()).or_default().insert(doc);
                let neighbors = graph.entry(term.clone()).or_default();
                neighbors.extend(terms.iter().filter(|other| *other != term).cloned());
            }
            doc_terms.push(terms);
        }

        debug!(
            "Relational index built: {} docs, {} terms",
            corpus.len(),
            graph.len()
        );

        Ok(Self {
            corpus,
            doc_terms,
            postings,
            graph,
        })
    }

    pub fn len(&self) -> usize {
        self.doc_terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_terms.is_empty()
    }

    /// Terms linked to `term`, in sorted order.
    pub fn neighbors(&self, term: &str) -> impl Iterator<Item = &str> {
        self.graph
            .get(term)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Breadth-first expansion from the literal terms.
    ///
    /// Returns every reached term with the hop at which it was first reached;
    /// literal terms are at hop 0.
    pub fn expand(&self, terms: &BTreeSet<String>, hops: usize) -> BTreeMap<String, usize> {
        let mut reached: BTreeMap<String, usize> =
            terms.iter().map(|term| (term.clone(), 0)).collect();
        let mut frontier: Vec<String> = terms.iter().cloned().collect();

        for hop in 1..=hops {
            let mut next = Vec::new();
            for term in &frontier {
                for neighbor in self.neighbors(term) {
                    if !reached.contains_key(neighbor) {
                        reached.insert(neighbor.to_string(), hop);
                        next.push(neighbor.to_string());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        reached
    }

    pub fn search(
        &self,
        query: &str,
        hops: usize,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>> {
        let literal: BTreeSet<String> = tokenize(query).into_iter().collect();
        if literal.is_empty() {
            return Ok(Vec::new());
        }

        let mut results = self.direct_tier(&literal, cancel)?;
        let direct: BTreeSet<DocId> = results.iter().map(|r| r.id).collect();

        let expanded = self.expand(&literal, hops);
        check_cancelled(cancel)?;
        results.extend(self.expanded_tier(&literal, &expanded, &direct, cancel)?);

        rank_and_truncate(&mut results, limit);
        debug!(
            "Relational search: {} expanded terms, {} documents",
            expanded.len(),
            results.len()
        );
        Ok(results)
    }

    fn direct_tier(
        &self,
        literal: &BTreeSet<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>> {
        let mut matches: BTreeMap<DocId, usize> = BTreeMap::new();
        for term in literal {
            for doc in self.postings.get(term).into_iter().flatten() {
                *matches.entry(*doc).or_insert(0) += 1;
            }
        }

        let query_terms = literal.len() as f32;
        let mut results = Vec::with_capacity(matches.len());
        for (idx, (doc, count)) in matches.into_iter().enumerate() {
            check_cancelled_at(idx, cancel)?;
            results.push(self.result(doc, count as f32 / query_terms, 0));
        }
        Ok(results)
    }

    fn expanded_tier(
        &self,
        literal: &BTreeSet<String>,
        expanded: &BTreeMap<String, usize>,
        direct: &BTreeSet<DocId>,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>> {
        // doc -> (matched expanded terms, nearest hop among them)
        let mut matches: BTreeMap<DocId, (usize, usize)> = BTreeMap::new();
        for (term, hop) in expanded {
            if literal.contains(term) {
                continue;
            }
            for doc in self.postings.get(term).into_iter().flatten() {
                if direct.contains(doc) {
                    continue;
                }
                let entry = matches.entry(*doc).or_insert((0, *hop));
                entry.0 += 1;
                entry.1 = entry.1.min(*hop);
            }
        }

        let expanded_size = expanded.len() as f32;
        let mut results = Vec::with_capacity(matches.len());
        for (idx, (doc, (count, hop))) in matches.into_iter().enumerate() {
            check_cancelled_at(idx, cancel)?;
            let score = count as f32 / expanded_size * EXPANSION_DISCOUNT;
            results.push(self.result(doc, score, hop));
        }
        Ok(results)
    }

    fn result(&self, id: DocId, score: f32, hops: usize) -> RetrievalResult {
        RetrievalResult {
            id,
            content: self.corpus[id].clone(),
            score,
            detail: SourceDetail::Relational { hops },
        }
    }
}

/// [`Retriever`] over a per-call co-occurrence graph
#[derive(Debug, Clone)]
pub struct RelationalRetriever {
    hops: usize,
}

impl RelationalRetriever {
    pub fn new(hops: usize) -> Self {
        Self { hops }
    }

    pub fn hops(&self) -> usize {
        self.hops
    }
}

impl Default for RelationalRetriever {
    fn default() -> Self {
        Self::new(DEFAULT_HOPS)
    }
}

impl Retriever for RelationalRetriever {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::Relational
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
        RelationalIndex::build(corpus, cancel)?.search(query, self.hops, limit, cancel)
    }
}
