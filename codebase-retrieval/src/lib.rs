/*!
# Codeindex Retrieval

Hybrid retrieval over a corpus of code units, combining:
- **Lexical search** via BM25 term statistics
- **Semantic search** via an injectable embedding provider
- **Relational search** via a term co-occurrence graph with hop expansion
- **Reciprocal Rank Fusion (RRF)** to merge the three rankings

## Architecture

```text
Query + Corpus
  ├─> LexicalIndex    (BM25, exact tokens)      ─┐
  ├─> SemanticIndex   (cosine similarity)       ─┼─> RRF ─> ranked FusedResult list
  └─> RelationalIndex (co-occurrence + hops)    ─┘
```

Sources run concurrently on blocking worker tasks. A source whose weight is
not strictly positive is never invoked. No index state survives a call:
document ids are positions in the supplied corpus.

## Example

```rust,no_run
use codeindex_retrieval::{FusionConfig, FusionEngine};

#[tokio::main]
async fn main() -> codeindex_retrieval::Result<()> {
    let corpus = vec![
        "fn parse_config(path: &Path) -> Config".to_string(),
        "fn render_widget(tree: &Tree)".to_string(),
    ];

    let engine = FusionEngine::new(FusionConfig::default());
    let response = engine.retrieve("parse config", corpus).await?;

    for result in response.top(5) {
        println!("{}. doc {} (score: {:.4})", result.rank, result.id, result.fused_score);
    }
    Ok(())
}
```

## Failure policy

`retrieve` is total over tuning parameters: blank queries, empty corpora and
`max_results == 0` return no results, `rrf_k` is replaced by its absolute
value (0 becomes 60, with a warning). Use [`FusionConfig::validate`] for
strict checking of configuration files.
*/

mod config;
mod engine;
mod error;
pub mod evaluation;
mod fusion;
mod lexical;
mod relational;
mod result;
mod retriever;
mod semantic;
mod tokenize;

pub use config::{DEFAULT_RRF_K, FusionConfig};
pub use engine::{FusionEngine, RetrieveRequest, retrieve};
pub use error::{Result, RetrievalError};
pub use fusion::reciprocal_rank_fusion;
pub use lexical::{BM25_B, BM25_K1, Bm25Params, LexicalIndex, LexicalRetriever};
pub use relational::{DEFAULT_HOPS, EXPANSION_DISCOUNT, RelationalIndex, RelationalRetriever};
pub use result::{
    DocId, FusedResult, FusionMetrics, RetrievalResult, RetrievalSource, RetrieveResponse,
    SourceDetail,
};
pub use retriever::Retriever;
pub use semantic::{SemanticIndex, SemanticRetriever};
pub use tokenize::tokenize;

pub use codeindex_embeddings::{Embedding, EmbeddingProvider, ShingleEmbedder};
pub use tokio_util::sync::CancellationToken;
