// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// An ordered sequence of phoneme symbols, e.g. `["K", "AA", "Z", "AH"]`.
pub type Pronunciation = Vec<String>;

/// A unique identifier for a word inside one loaded lexicon.
pub type WordId = usize;

/// One distinct word of the lexicon with every pronunciation the source
/// lists for it, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub word: String,
    pub pronunciations: Vec<Pronunciation>,
}

/// Declared layout of a lexicon source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `word ph1 ph2 ...`, one pronunciation per line.
    Text,
    /// `(word, phonemes, pron_order)` rows: a SQLite `word_phonemes` table
    /// or a `.tsv`/`.csv` export of it.
    Tabular,
}

impl SourceKind {
    /// Guesses the kind from a file extension. Anything that is not a
    /// database or a table export is read as text.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("db") | Some("sqlite") | Some("tsv") | Some("csv") => SourceKind::Tabular,
            _ => SourceKind::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Text => "text",
            SourceKind::Tabular => "tabular",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(SourceKind::Text),
            "tabular" | "table" | "db" | "sqlite" | "tsv" | "csv" => Ok(SourceKind::Tabular),
            other => Err(format!("unknown lexicon kind '{}'", other)),
        }
    }
}

/// Where a lexicon lives and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconSource {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl LexiconSource {
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self { path: path.into(), kind }
    }

    pub fn text(path: impl Into<PathBuf>) -> Self {
        Self::new(path, SourceKind::Text)
    }

    pub fn tabular(path: impl Into<PathBuf>) -> Self {
        Self::new(path, SourceKind::Tabular)
    }

    /// Source whose kind is inferred from the file extension.
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = SourceKind::from_path(&path);
        Self { path, kind }
    }
}

/// Five discrete recognition buckets derived from a continuous score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Excellent,
    Good,
    Moderate,
    Poor,
    Unknown,
}

impl ConfidenceTier {
    /// Fixed thresholds: `[0.95,1]` excellent, `[0.70,0.95)` good,
    /// `[0.50,0.70)` moderate, `[0.25,0.50)` poor, below that unknown.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.95 {
            ConfidenceTier::Excellent
        } else if score >= 0.70 {
            ConfidenceTier::Good
        } else if score >= 0.50 {
            ConfidenceTier::Moderate
        } else if score >= 0.25 {
            ConfidenceTier::Poor
        } else {
            ConfidenceTier::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Excellent => "excellent",
            ConfidenceTier::Good => "good",
            ConfidenceTier::Moderate => "moderate",
            ConfidenceTier::Poor => "poor",
            ConfidenceTier::Unknown => "unknown",
        }
    }

    pub fn is_problematic(&self) -> bool {
        matches!(self, ConfidenceTier::Poor | ConfidenceTier::Unknown)
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a word was (or was not) resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Known,
    Guessed,
    Unknown,
    Error,
}

/// A known word ranked by orthographic closeness to some target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarWord {
    pub word: String,
    pub score: f64,
}

/// Verdict for a single word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordPrediction {
    pub word: String,
    pub status: ValidationStatus,
    pub confidence_tier: ConfidenceTier,
    pub confidence_score: f64,
    pub in_lexicon: bool,
    pub pronunciations: Vec<Pronunciation>,
    pub g2p_available: bool,
    pub g2p_pronunciation: Option<Pronunciation>,
    pub g2p_confidence: Option<f64>,
    pub similar_words: Vec<SimilarWord>,
    pub recommendation: String,
    pub notes: Vec<String>,
}

impl WordPrediction {
    /// The UNKNOWN-tier prediction returned when analysis itself failed.
    pub fn failed(word: &str, note: String) -> Self {
        Self {
            word: word.to_string(),
            status: ValidationStatus::Error,
            confidence_tier: ConfidenceTier::Unknown,
            confidence_score: 0.0,
            in_lexicon: false,
            pronunciations: Vec::new(),
            g2p_available: false,
            g2p_pronunciation: None,
            g2p_confidence: None,
            similar_words: Vec::new(),
            recommendation: "Analysis failed: word could not be evaluated".to_string(),
            notes: vec![note],
        }
    }

    pub fn is_known(&self) -> bool {
        self.in_lexicon
    }

    pub fn best_match(&self) -> Option<&SimilarWord> {
        self.similar_words.first()
    }
}

/// Verdict for a multi-word identifier, derived from its tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPrediction {
    pub entity_name: String,
    pub word_predictions: Vec<WordPrediction>,
    pub overall_tier: ConfidenceTier,
    pub overall_score: f64,
    /// Percentage (0-100) of tokens scoring at least 0.7.
    pub recognition_percentage: f64,
    pub recommendations: Vec<String>,
    pub suggested_alternatives: Vec<String>,
}

/// Summary over a batch of entity names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub model_id: String,
    pub total_entities: usize,
    pub known_entities: usize,
    pub unknown_entities: usize,
    pub partially_known_entities: usize,
    pub entity_results: Vec<EntityPrediction>,
    pub overall_score: f64,
    pub recommendations: Vec<String>,
}

/// Fixed-shape summary of a loaded lexicon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconStatistics {
    pub total_words: usize,
    pub total_pronunciations: usize,
    pub avg_pronunciations_per_word: f64,
    pub sample_words: Vec<String>,
    pub source_kind: SourceKind,
    /// The line-oriented text format is the compact "optimized" layout.
    pub optimized_format: bool,
    pub source_path: PathBuf,
    pub skipped_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatistics {
    pub model_id: String,
    pub lexicon: LexiconStatistics,
    pub g2p_available: bool,
    pub lookup_cache_entries: usize,
    pub g2p_cache_entries: usize,
}
