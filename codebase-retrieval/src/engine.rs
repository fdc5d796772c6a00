use crate::config::FusionConfig;
use crate::error::{Result, RetrievalError};
use crate::fusion::reciprocal_rank_fusion;
use crate::lexical::LexicalRetriever;
use crate::relational::RelationalRetriever;
use crate::result::{FusionMetrics, RetrievalResult, RetrievalSource, RetrieveResponse};
use crate::retriever::{Retriever, check_cancelled};
use crate::semantic::SemanticRetriever;
use codeindex_embeddings::{EmbeddingProvider, ShingleEmbedder};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// External input of a retrieval call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,

    /// One entry per retrievable unit; ids are positions in this list
    pub corpus: Vec<String>,

    /// Partial override of the default configuration; absent or null means defaults
    #[serde(default)]
    pub config: Option<FusionConfig>,
}

/// Hybrid retrieval over lexical, semantic and relational sources.
///
/// Which sources run is decided once, from the weights, when the engine is
/// built. Each call rebuilds all statistics from the supplied corpus; the
/// engine holds no index state and can be shared between tasks.
pub struct FusionEngine {
    config: FusionConfig,
    rrf_k: u64,
    lexical: Option<Arc<dyn Retriever>>,
    semantic: Option<Arc<dyn Retriever>>,
    relational: Option<Arc<dyn Retriever>>,
}

impl FusionEngine {
    /// Engine using the character-shingle embedder for the semantic source.
    pub fn new(config: FusionConfig) -> Self {
        let embedder = match ShingleEmbedder::new(config.shingle_size) {
            Ok(embedder) => embedder,
            Err(err) => {
                warn!("{err}; using default shingle size");
                ShingleEmbedder::default()
            }
        };
        Self::with_embedder(config, Arc::new(embedder))
    }

    /// Engine with an injected embedding backend.
    pub fn with_embedder(config: FusionConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let hops = if config.relational_hops == 0 {
            warn!("relational_hops of 0 is invalid, using 1");
            1
        } else {
            config.relational_hops
        };

        let lexical = config
            .is_enabled(RetrievalSource::Lexical)
            .then(|| Arc::new(LexicalRetriever::default()) as Arc<dyn Retriever>);
        let semantic = config
            .is_enabled(RetrievalSource::Semantic)
            .then(|| Arc::new(SemanticRetriever::new(embedder)) as Arc<dyn Retriever>);
        let relational = config
            .is_enabled(RetrievalSource::Relational)
            .then(|| Arc::new(RelationalRetriever::new(hops)) as Arc<dyn Retriever>);

        let rrf_k = config.effective_rrf_k();
        Self {
            config,
            rrf_k,
            lexical,
            semantic,
            relational,
        }
    }

    /// Replace the retriever for its source. Ignored when that source is
    /// disabled by configuration.
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        let source = retriever.source();
        if !self.config.is_enabled(source) {
            debug!("{source:?} retriever ignored: source disabled");
            return self;
        }
        *self.slot_mut(source) = Some(retriever);
        self
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn enabled_sources(&self) -> Vec<RetrievalSource> {
        RetrievalSource::ALL
            .into_iter()
            .filter(|source| self.slot(*source).is_some())
            .collect()
    }

    pub async fn retrieve(
        &self,
        query: &str,
        corpus: impl Into<Arc<[String]>>,
    ) -> Result<RetrieveResponse> {
        self.retrieve_with_cancel(query, corpus, CancellationToken::new())
            .await
    }

    /// Run every enabled source concurrently and fuse their rankings.
    ///
    /// Blank queries, empty corpora and `max_results == 0` yield an empty
    /// response. Fails only on cancellation, embedding backend errors or a
    /// crashed worker task.
    pub async fn retrieve_with_cancel(
        &self,
        query: &str,
        corpus: impl Into<Arc<[String]>>,
        cancel: CancellationToken,
    ) -> Result<RetrieveResponse> {
        let start = Instant::now();
        let corpus: Arc<[String]> = corpus.into();

        if query.trim().is_empty() || corpus.is_empty() || self.config.max_results == 0 {
            debug!("Degenerate retrieval request, returning no results");
            return Ok(RetrieveResponse {
                results: Vec::new(),
                metrics: FusionMetrics {
                    fusion_time_ms: start.elapsed().as_millis() as u64,
                    ..Default::default()
                },
            });
        }

        debug!(
            "Hybrid retrieval for '{query}' over {} documents, sources {:?}",
            corpus.len(),
            self.enabled_sources()
        );

        // Child token so a failing source can stop its siblings without
        // cancelling the caller's token. Dropping this future cancels it too.
        let cancel = cancel.child_token();
        let _guard = cancel.clone().drop_guard();
        let limit = self.config.per_source_limit();
        let mut tasks: Vec<(RetrievalSource, JoinHandle<Result<Vec<RetrievalResult>>>)> =
            Vec::with_capacity(RetrievalSource::ALL.len());
        for source in RetrievalSource::ALL {
            let Some(retriever) = self.slot(source).cloned() else {
                continue;
            };
            let corpus = Arc::clone(&corpus);
            let query = query.to_string();
            let cancel = cancel.clone();
            let handle = tokio::task::spawn_blocking(move || {
                retriever.search(&query, &corpus, limit, &cancel)
            });
            tasks.push((source, handle));
        }

        let mut metrics = FusionMetrics::default();
        let mut lists = Vec::with_capacity(tasks.len());
        for (source, handle) in tasks {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => Err(RetrievalError::Task(join_err.to_string())),
            };
            match outcome {
                Ok(list) => {
                    debug!("{source:?} search returned {} results", list.len());
                    metrics.set_count(source, list.len());
                    lists.push(list);
                }
                Err(err) => {
                    cancel.cancel();
                    return Err(err);
                }
            }
        }
        check_cancelled(&cancel)?;

        let mut results = reciprocal_rank_fusion(&lists, self.rrf_k);
        metrics.candidate_count = results.len();
        results.truncate(self.config.max_results);
        metrics.fusion_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Retrieval completed in {}ms, returned {} of {} candidates",
            metrics.fusion_time_ms,
            results.len(),
            metrics.candidate_count
        );

        Ok(RetrieveResponse { results, metrics })
    }

    fn slot(&self, source: RetrievalSource) -> Option<&Arc<dyn Retriever>> {
        match source {
            RetrievalSource::Lexical => self.lexical.as_ref(),
            RetrievalSource::Semantic => self.semantic.as_ref(),
            RetrievalSource::Relational => self.relational.as_ref(),
        }
    }

    fn slot_mut(&mut self, source: RetrievalSource) -> &mut Option<Arc<dyn Retriever>> {
        match source {
            RetrievalSource::Lexical => &mut self.lexical,
            RetrievalSource::Semantic => &mut self.semantic,
            RetrievalSource::Relational => &mut self.relational,
        }
    }
}

/// One-shot retrieval with the default embedder.
pub async fn retrieve(request: RetrieveRequest) -> Result<RetrieveResponse> {
    let RetrieveRequest {
        query,
        corpus,
        config,
    } = request;
    FusionEngine::new(config.unwrap_or_default())
        .retrieve(&query, corpus)
        .await
}
