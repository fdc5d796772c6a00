use crate::error::{Result, RetrievalError};
use crate::result::RetrievalSource;
use log::warn;
use serde::{Deserialize, Serialize};

/// RRF constant used when the configured value is zero
pub const DEFAULT_RRF_K: u64 = 60;

/// Configuration for hybrid retrieval and fusion.
///
/// Every field has a serde default, so a partial TOML or JSON document is a
/// valid override of [`FusionConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Lexical (BM25) source switch; the source runs only when > 0
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,

    /// Semantic (embedding) source switch; the source runs only when > 0
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Relational (co-occurrence graph) source switch; the source runs only when > 0
    #[serde(default = "default_relational_weight")]
    pub relational_weight: f32,

    /// RRF constant k (higher = less emphasis on top results)
    #[serde(default = "default_rrf_k")]
    pub rrf_k: i64,

    /// Final number of results to return after fusion
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Number of candidates requested from each source before fusion
    #[serde(default = "default_candidate_pool_size")]
    pub candidate_pool_size: usize,

    /// Breadth-first hops taken across the co-occurrence graph
    #[serde(default = "default_relational_hops")]
    pub relational_hops: usize,

    /// Character window of the default shingle embedder
    #[serde(default = "default_shingle_size")]
    pub shingle_size: usize,
}

fn default_lexical_weight() -> f32 {
    0.4
}

fn default_semantic_weight() -> f32 {
    0.4
}

fn default_relational_weight() -> f32 {
    0.2
}

fn default_rrf_k() -> i64 {
    DEFAULT_RRF_K as i64
}

fn default_max_results() -> usize {
    10
}

fn default_candidate_pool_size() -> usize {
    50
}

fn default_relational_hops() -> usize {
    1
}

fn default_shingle_size() -> usize {
    codeindex_embeddings::DEFAULT_SHINGLE_SIZE
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            lexical_weight: default_lexical_weight(),
            semantic_weight: default_semantic_weight(),
            relational_weight: default_relational_weight(),
            rrf_k: default_rrf_k(),
            max_results: default_max_results(),
            candidate_pool_size: default_candidate_pool_size(),
            relational_hops: default_relational_hops(),
            shingle_size: default_shingle_size(),
        }
    }
}

impl FusionConfig {
    /// Strict validation for configuration loaded from files.
    ///
    /// `retrieve` never calls this: at query time out-of-range values are
    /// corrected or treated as "disabled" instead of failing.
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [
            ("lexical_weight", self.lexical_weight),
            ("semantic_weight", self.semantic_weight),
            ("relational_weight", self.relational_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RetrievalError::InvalidConfiguration(format!(
                    "{name} must be a finite value >= 0, got {weight}"
                )));
            }
        }

        if self.rrf_k == 0 {
            return Err(RetrievalError::InvalidConfiguration(
                "rrf_k must be non-zero".to_string(),
            ));
        }

        if self.candidate_pool_size == 0 {
            return Err(RetrievalError::InvalidConfiguration(
                "candidate_pool_size must be > 0".to_string(),
            ));
        }

        if self.relational_hops == 0 {
            return Err(RetrievalError::InvalidConfiguration(
                "relational_hops must be > 0".to_string(),
            ));
        }

        if self.shingle_size == 0 {
            return Err(RetrievalError::InvalidConfiguration(
                "shingle_size must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a (possibly partial) TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| RetrievalError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a (possibly partial) JSON document.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| RetrievalError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// RRF constant actually used for fusion: `|rrf_k|`, with 0 mapped to
    /// [`DEFAULT_RRF_K`].
    pub fn effective_rrf_k(&self) -> u64 {
        match self.rrf_k.unsigned_abs() {
            0 => {
                warn!("rrf_k of 0 is invalid, falling back to {DEFAULT_RRF_K}");
                DEFAULT_RRF_K
            }
            k => {
                if self.rrf_k < 0 {
                    warn!("negative rrf_k {} replaced by {k}", self.rrf_k);
                }
                k
            }
        }
    }

    pub fn weight(&self, source: RetrievalSource) -> f32 {
        match source {
            RetrievalSource::Lexical => self.lexical_weight,
            RetrievalSource::Semantic => self.semantic_weight,
            RetrievalSource::Relational => self.relational_weight,
        }
    }

    /// A source is invoked only when its weight is strictly positive.
    pub fn is_enabled(&self, source: RetrievalSource) -> bool {
        self.weight(source) > 0.0
    }

    /// Length of the ranked list requested from each source.
    pub fn per_source_limit(&self) -> usize {
        self.candidate_pool_size.max(self.max_results)
    }

    /// Only BM25 term matching
    pub fn lexical_only() -> Self {
        Self {
            lexical_weight: 1.0,
            semantic_weight: 0.0,
            relational_weight: 0.0,
            ..Default::default()
        }
    }

    /// Only embedding similarity
    pub fn semantic_only() -> Self {
        Self {
            lexical_weight: 0.0,
            semantic_weight: 1.0,
            relational_weight: 0.0,
            ..Default::default()
        }
    }

    /// Only co-occurrence graph overlap
    pub fn relational_only() -> Self {
        Self {
            lexical_weight: 0.0,
            semantic_weight: 0.0,
            relational_weight: 1.0,
            ..Default::default()
        }
    }
}
