// File: src/error.rs
//! Error taxonomy for lexicon loading, prediction and engine activation.
//!
//! Only lexicon activation can fail from a caller's point of view. Lookup
//! misses are ordinary results, and prediction failures are downgraded to
//! an UNKNOWN prediction before they reach the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("lexicon source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("lexicon source {} is corrupt: {reason}", path.display())]
    SourceCorrupt { path: PathBuf, reason: String },

    #[error("failed to read lexicon source {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lexicon table {}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unreadable lexicon database {}", path.display())]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("unreadable lexicon snapshot {}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },
}

impl LexiconError {
    /// True when the source exists but cannot be used as a lexicon.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            LexiconError::SourceCorrupt { .. }
                | LexiconError::Table { .. }
                | LexiconError::Database { .. }
                | LexiconError::Snapshot { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            LexiconError::SourceNotFound { path }
        } else {
            LexiconError::Io { path, source }
        }
    }
}

/// Failure inside a single word prediction. Never returned to callers of
/// the predictor; it is logged and folded into the prediction's notes.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("G2P failed: {0}")]
    G2p(String),

    #[error("internal prediction error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("model {model_id} declares no lexicon source")]
    NoLexicon { model_id: String },

    #[error(transparent)]
    Lexicon(#[from] LexiconError),
}

impl EngineError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, EngineError::Lexicon(e) if e.is_corrupt())
    }
}
