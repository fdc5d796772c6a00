use crate::error::Result;
use crate::result::{DocId, RetrievalResult, RetrievalSource, SourceDetail, rank_and_truncate};
use crate::retriever::{Retriever, check_cancelled, check_cancelled_at};
use codeindex_embeddings::{Embedding, EmbeddingProvider, ShingleEmbedder, cosine_similarity};
use log::debug;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Texts sent to the provider per batch; cancellation is polled between batches
const EMBED_BATCH_SIZE: usize = 64;

/// Document vectors for one corpus
pub struct SemanticIndex<'a> {
    corpus: &'a [String],
    embedder: &'a dyn EmbeddingProvider,
    vectors: Vec<Embedding>,
}

impl<'a> SemanticIndex<'a> {
    pub fn build(
        corpus: &'a [String],
        embedder: &'a dyn EmbeddingProvider,
        cancel: &CancellationToken,
    ) -> Result<Self> {
        let mut vectors = Vec::with_capacity(corpus.len());
        for batch in corpus.chunks(EMBED_BATCH_SIZE) {
            check_cancelled(cancel)?;
            vectors.extend(embedder.embed_batch(batch)?);
        }

        debug!(
            "Semantic index built: {} vectors via {}",
            vectors.len(),
            embedder.name()
        );

        Ok(Self {
            corpus,
            embedder,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Rank documents by cosine similarity to the query vector.
    ///
    /// Non-positive similarities are not matches.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed(query)?;
        if query_vector.is_zero() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for (doc, vector) in self.vectors.iter().enumerate() {
            check_cancelled_at(doc, cancel)?;
            let similarity = cosine_similarity(&query_vector, vector);
            if similarity > 0.0 {
                results.push(self.result(doc, similarity));
            }
        }
        rank_and_truncate(&mut results, limit);

        debug!("Semantic search matched {} documents", results.len());
        Ok(results)
    }

    fn result(&self, id: DocId, similarity: f32) -> RetrievalResult {
        RetrievalResult {
            id,
            content: self.corpus[id].clone(),
            // float error can push identical vectors marginally above 1
            score: similarity.min(1.0),
            detail: SourceDetail::Semantic { similarity },
        }
    }
}

/// [`Retriever`] that embeds the corpus through an injected provider
#[derive(Clone)]
pub struct SemanticRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl SemanticRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }
}

impl Default for SemanticRetriever {
    fn default() -> Self {
        Self::new(Arc::new(ShingleEmbedder::default()))
    }
}

impl Retriever for SemanticRetriever {
    fn source(&self) -> RetrievalSource {
        RetrievalSource::Semantic
    }

    fn search(
        &self,
        query: &str,
        corpus: &[String],
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetrievalResult>> {
        if query.trim().is_empty() || corpus.is_empty() {
            return Ok(Vec::new());
        }
        SemanticIndex::build(corpus, self.embedder.as_ref(), cancel)?.search(query, limit, cancel)
    }
}
