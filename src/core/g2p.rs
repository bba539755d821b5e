// File: src/core/g2p.rs
use crate::core::lexicon::DEFAULT_CACHE_CAPACITY;
use crate::core::types::Pronunciation;
use crate::error::PredictionError;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A pronunciation estimated from spelling alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct G2pGuess {
    pub pronunciation: Pronunciation,
    pub confidence: f64,
}

/// Grapheme-to-phoneme capability. `Ok(None)` means no estimate could be
/// produced for this word; `Err` means the model itself failed.
pub trait G2pModel: Send + Sync {
    fn predict_pronunciation(&self, word: &str) -> Result<Option<G2pGuess>, PredictionError>;

    fn is_available(&self) -> bool {
        true
    }
}

/// Used when the active model ships no G2P artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoG2p;

impl G2pModel for NoG2p {
    fn predict_pronunciation(&self, _word: &str) -> Result<Option<G2pGuess>, PredictionError> {
        Ok(None)
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Placeholder G2P: a fixed letter -> phoneme table with a constant
/// confidence. Stands in until a trained model is plugged in.
#[derive(Debug, Clone)]
pub struct LetterToPhoneme {
    confidence: f64,
}

impl LetterToPhoneme {
    pub fn new(confidence: f64) -> Self {
        Self { confidence: confidence.clamp(0.0, 1.0) }
    }

    /// Transliterates a full word, skipping letters outside the table.
    pub fn transliterate(&self, word: &str) -> Pronunciation {
        normalize_for_g2p(word)
            .chars()
            .flat_map(|c| self.get_phonemes(c).iter().map(|s| s.to_string()))
            .collect()
    }

    fn get_phonemes(&self, c: char) -> &'static [&'static str] {
        match c {
            'a' => &["a"], 'e' => &["e"], 'i' => &["i"], 'o' => &["o"], 'u' => &["u"],
            'b' => &["b"], 'c' => &["k"], 'd' => &["d"], 'f' => &["f"],
            'g' => &["g"], 'j' => &["j"], 'k' => &["k"], 'l' => &["l"],
            'm' => &["m"], 'n' => &["n"], 'p' => &["p"], 'q' => &["k"],
            'r' => &["r"], 's' => &["s"], 't' => &["t"], 'v' => &["v"],
            'w' => &["w"], 'x' => &["k", "s"], 'y' => &["i"], 'z' => &["z"],
            // 'h' is silent; anything else is outside the table.
            _ => &[],
        }
    }
}

impl Default for LetterToPhoneme {
    fn default() -> Self {
        Self::new(0.7)
    }
}

impl G2pModel for LetterToPhoneme {
    fn predict_pronunciation(&self, word: &str) -> Result<Option<G2pGuess>, PredictionError> {
        let pronunciation = self.transliterate(word);
        if pronunciation.is_empty() {
            return Ok(None);
        }
        Ok(Some(G2pGuess { pronunciation, confidence: self.confidence }))
    }
}

/// Lowercases and drops `_`, `-` and whitespace.
pub fn normalize_for_g2p(word: &str) -> String {
    word.chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Wraps a [`G2pModel`] with a per-model result cache. Failures are not
/// cached so a transient error can be retried. The cache is emptied when it
/// reaches `capacity` entries.
pub struct CachedG2p {
    model: Arc<dyn G2pModel>,
    cache: DashMap<String, Option<G2pGuess>>,
    capacity: usize,
}

impl CachedG2p {
    pub fn new(model: Arc<dyn G2pModel>) -> Self {
        Self::with_capacity(model, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(model: Arc<dyn G2pModel>, capacity: usize) -> Self {
        Self { model, cache: DashMap::new(), capacity: capacity.max(1) }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_available()
    }

    pub fn predict(&self, word: &str) -> Result<Option<G2pGuess>, PredictionError> {
        if !self.model.is_available() {
            return Ok(None);
        }
        let key = normalize_for_g2p(word);
        if let Some(hit) = self.cache.get(&key) {
            debug!("G2P cache hit for '{}'", key);
            return Ok(hit.clone());
        }
        let guess = self.model.predict_pronunciation(&key)?;
        if self.cache.len() >= self.capacity {
            debug!("G2P cache full at {} entries, clearing", self.capacity);
            self.cache.clear();
        }
        self.cache.insert(key, guess.clone());
        Ok(guess)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl std::fmt::Debug for CachedG2p {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedG2p")
            .field("available", &self.model.is_available())
            .field("cached", &self.cache.len())
            .finish()
    }
}
