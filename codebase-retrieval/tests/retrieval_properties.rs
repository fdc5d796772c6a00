use codeindex_retrieval::evaluation::{QueryMetrics, RelevanceJudgment};
use codeindex_retrieval::{
    CancellationToken, DocId, FusionConfig, FusionEngine, LexicalRetriever, RelationalRetriever,
    RetrievalSource, Retriever, SemanticRetriever, SourceDetail, reciprocal_rank_fusion,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

/// A small codebase split into one unit per function
fn code_corpus() -> Vec<String> {
    [
        "fn calculate_sum(a: i32, b: i32) -> i32 { a + b }",
        "fn process_data(data: Vec<String>) -> Vec<String> { data.iter().map(|s| s.to_uppercase()).collect() }",
        "pub async fn retry_with_backoff(max_retries: u32) -> Result<()> { sleep(backoff).await }",
        "impl fmt::Display for AppError { fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, \"error\") } }",
        "fn parse_config(path: &Path) -> Result<Config> { let text = read_to_string(path)?; toml::from_str(&text) }",
        "fn load_config_or_default(path: &Path) -> Config { parse_config(path).unwrap_or_default() }",
        "struct Config { retries: u32, timeout_ms: u64 }",
        "fn render_widget(tree: &Tree, area: Rect) { tree.draw(area) }",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn ids(results: &[codeindex_retrieval::FusedResult]) -> Vec<DocId> {
    results.iter().map(|r| r.id).collect()
}

#[tokio::test]
async fn test_result_shape_with_default_weights() {
    let corpus = code_corpus();
    for max_results in [1, 3, 10] {
        let engine = FusionEngine::new(FusionConfig {
            max_results,
            ..Default::default()
        });
        for query in ["parse config", "retry backoff error", "widget"] {
            let response = engine.retrieve(query, corpus.clone()).await.unwrap();
            assert!(response.len() <= max_results);
            assert!(!response.is_empty(), "no results for {query}");

            for pair in response.results.windows(2) {
                assert!(pair[0].fused_score >= pair[1].fused_score);
            }
            let ranks: Vec<usize> = response.results.iter().map(|r| r.rank).collect();
            let expected: Vec<usize> = (1..=response.len()).collect();
            assert_eq!(ranks, expected);
        }
    }
}

#[tokio::test]
async fn test_disabling_relational_matches_two_source_fusion() {
    let corpus = code_corpus();
    let query = "parse config path";
    let config = FusionConfig {
        relational_weight: 0.0,
        ..Default::default()
    };

    let response = FusionEngine::new(config.clone())
        .retrieve(query, corpus.clone())
        .await
        .unwrap();
    assert_eq!(response.metrics.relational_count, 0);

    let cancel = CancellationToken::new();
    let limit = config.per_source_limit();
    let lexical = LexicalRetriever::default()
        .search(query, &corpus, limit, &cancel)
        .unwrap();
    let semantic = SemanticRetriever::default()
        .search(query, &corpus, limit, &cancel)
        .unwrap();
    let mut expected = reciprocal_rank_fusion(&[lexical, semantic], 60);
    expected.truncate(config.max_results);

    assert_eq!(response.results, expected);
    for result in &response.results {
        assert!(!result.component_scores.contains_key(&RetrievalSource::Relational));
    }
}

#[tokio::test]
async fn test_lexical_matching_is_exact_token() {
    let corpus: Vec<String> = ["the cat sat", "the dog ran", "cats and dogs"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let response = FusionEngine::new(FusionConfig::lexical_only())
        .retrieve("cat", corpus)
        .await
        .unwrap();

    let order = ids(&response.results);
    let first = order.iter().position(|id| *id == 0);
    let third = order.iter().position(|id| *id == 2);
    assert_eq!(first, Some(0));
    assert!(third.is_none() || third > first);
    assert_eq!(response.metrics.semantic_count, 0);
    assert_eq!(response.metrics.relational_count, 0);
}

#[test]
fn test_identical_rankings_fuse_to_same_order() {
    let corpus = code_corpus();
    let cancel = CancellationToken::new();
    let lexical = LexicalRetriever::default()
        .search("config path result", &corpus, 50, &cancel)
        .unwrap();
    let expected_order: Vec<DocId> = lexical.iter().map(|r| r.id).collect();
    assert!(expected_order.len() > 1);

    let fused = reciprocal_rank_fusion(&[lexical.clone(), lexical], 60);
    assert_eq!(ids(&fused), expected_order);
}

#[tokio::test]
async fn test_blank_query_returns_zero_metrics() {
    let response = FusionEngine::new(FusionConfig::default())
        .retrieve("", code_corpus())
        .await
        .unwrap();
    assert!(response.results.is_empty());
    assert_eq!(response.metrics.lexical_count, 0);
    assert_eq!(response.metrics.semantic_count, 0);
    assert_eq!(response.metrics.relational_count, 0);
}

#[tokio::test]
async fn test_zero_max_results_is_empty() {
    let engine = FusionEngine::new(FusionConfig {
        max_results: 0,
        ..Default::default()
    });
    for query in ["config", "anything at all", "fn"] {
        let response = engine.retrieve(query, code_corpus()).await.unwrap();
        assert!(response.results.is_empty());
    }
}

#[test]
fn test_direct_relational_match_outranks_equal_expanded_match() {
    let corpus: Vec<String> = ["config parser", "parser lexer", "lexer"]
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let results = RelationalRetriever::default()
        .search("config", &corpus, 10, &CancellationToken::new())
        .unwrap();

    let direct = results
        .iter()
        .find(|r| matches!(r.detail, SourceDetail::Relational { hops: 0 }))
        .unwrap();
    let expanded = results
        .iter()
        .find(|r| matches!(r.detail, SourceDetail::Relational { hops: 1 }))
        .unwrap();
    // both match exactly one term
    assert_eq!(direct.id, 0);
    assert_eq!(expanded.id, 1);
    assert!(direct.score >= expanded.score);
}

#[tokio::test]
async fn test_repeated_calls_are_deterministic() {
    let engine = FusionEngine::new(FusionConfig::default());
    let first = engine.retrieve("config", code_corpus()).await.unwrap();
    for _ in 0..5 {
        let again = engine.retrieve("config", code_corpus()).await.unwrap();
        assert_eq!(again.results, first.results);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_engine() {
    let engine = Arc::new(FusionEngine::new(FusionConfig::default()));
    let expected = engine.retrieve("retry backoff", code_corpus()).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.retrieve("retry backoff", code_corpus()).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.results, expected.results);
    }
}

#[tokio::test]
async fn test_relevant_document_ranks_first_for_precise_query() {
    let response = FusionEngine::new(FusionConfig::default())
        .retrieve("parse_config path", code_corpus())
        .await
        .unwrap();
    let judgments = vec![
        RelevanceJudgment::relevant(4),
        RelevanceJudgment::relevant(5),
    ];
    let metrics = QueryMetrics::compute(&response.results, &judgments);
    assert_eq!(metrics.reciprocal_rank, 1.0);
    assert_eq!(metrics.recall_at_k.get(&10), Some(&1.0));
}
