// File: src/config.rs
use crate::core::lexicon::DEFAULT_CACHE_CAPACITY;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How similarity candidates are drawn from the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStrategy {
    /// Only words sharing the target's first `prefix_len` characters.
    Prefix,
    /// Every word in the vocabulary.
    FullScan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    pub max_results: usize,
    /// Candidates must score strictly above this.
    pub min_score: f64,
    pub strategy: CandidateStrategy,
    pub prefix_len: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            min_score: 0.5,
            strategy: CandidateStrategy::Prefix,
            prefix_len: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of the best similarity added to an unknown word's score.
    pub similarity_boost: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { similarity_boost: 0.3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct G2pConfig {
    pub placeholder_confidence: f64,
    /// Enable the placeholder even when the model ships no G2P artifact.
    pub always_enabled: bool,
}

impl Default for G2pConfig {
    fn default() -> Self {
        Self { placeholder_confidence: 0.7, always_enabled: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub min_word_count: usize,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self { min_word_count: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub sample_size: usize,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self { sample_size: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entries the lookup and G2P caches each hold before being emptied.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: DEFAULT_CACHE_CAPACITY }
    }
}

/// Tunables for the validator. Every field has a default, so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub similarity: SimilarityConfig,
    pub scoring: ScoringConfig,
    pub g2p: G2pConfig,
    pub verification: VerificationConfig,
    pub statistics: StatisticsConfig,
    pub cache: CacheConfig,
}

impl ValidatorConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f64| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, v)))
            }
        };
        unit("similarity.min_score", self.similarity.min_score)?;
        unit("scoring.similarity_boost", self.scoring.similarity_boost)?;
        unit("g2p.placeholder_confidence", self.g2p.placeholder_confidence)?;

        if self.similarity.max_results == 0 {
            return Err(ConfigError::Invalid("similarity.max_results must be > 0".into()));
        }
        if self.similarity.prefix_len == 0 {
            return Err(ConfigError::Invalid("similarity.prefix_len must be > 0".into()));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid("cache.max_entries must be > 0".into()));
        }
        Ok(())
    }
}
