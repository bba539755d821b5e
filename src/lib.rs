// src/lib.rs
//! Lexicon lookup and recognizability scoring for a speech recognizer.
//!
//! A [`ValidatorEngine`] activates one model at a time, answers whether a
//! word is in its pronunciation lexicon, and grades words and multi-word
//! entity names by how likely the recognizer is to pick them up.

pub mod config;
pub mod core;
pub mod error;
pub mod fuzzy;
pub mod persistence;
pub mod predict;

pub use crate::config::ValidatorConfig;
pub use crate::core::engine::ValidatorEngine;
pub use crate::core::model::ModelInfo;
pub use crate::core::types::{
    ConfidenceTier, EngineStatistics, EntityPrediction, LexiconSource, LexiconStatistics,
    SimilarWord, SourceKind, ValidationReport, ValidationStatus, WordPrediction,
};
pub use crate::error::{EngineError, LexiconError};
