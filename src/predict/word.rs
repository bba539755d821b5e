// File: src/predict/word.rs
use crate::config::{ScoringConfig, ValidatorConfig};
use crate::core::g2p::{CachedG2p, G2pModel};
use crate::core::lexicon::LexiconStore;
use crate::core::types::{ConfidenceTier, SimilarWord, ValidationStatus, WordPrediction};
use crate::error::PredictionError;
use crate::fuzzy::ranker::SimilarityRanker;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Produces one verdict per word from lexicon membership, an optional G2P
/// guess and near-miss similarity.
///
/// Bound to one lexicon for its whole life: switching models means
/// building a new predictor, which also drops both caches.
#[derive(Debug)]
pub struct WordPredictor {
    store: Arc<LexiconStore>,
    g2p: CachedG2p,
    ranker: SimilarityRanker,
    scoring: ScoringConfig,
}

impl WordPredictor {
    pub fn new(store: Arc<LexiconStore>, g2p: Arc<dyn G2pModel>, config: &ValidatorConfig) -> Self {
        Self {
            store,
            g2p: CachedG2p::with_capacity(g2p, config.cache.max_entries),
            ranker: SimilarityRanker::new(config.similarity.clone()),
            scoring: config.scoring.clone(),
        }
    }

    pub fn store(&self) -> &Arc<LexiconStore> {
        &self.store
    }

    pub fn g2p_available(&self) -> bool {
        self.g2p.is_available()
    }

    pub fn g2p_cache_len(&self) -> usize {
        self.g2p.cache_len()
    }

    pub fn clear_caches(&self) {
        self.store.clear_cache();
        self.g2p.clear_cache();
    }

    /// Always returns a prediction. Failures inside the G2P model, panics
    /// included, become an UNKNOWN prediction with an explanatory note.
    pub fn predict(&self, word: &str) -> WordPrediction {
        match catch_unwind(AssertUnwindSafe(|| self.try_predict(word))) {
            Ok(Ok(prediction)) => prediction,
            Ok(Err(e)) => {
                error!("Error predicting word '{}': {}", word, e);
                WordPrediction::failed(word, format!("Prediction error: {}", e))
            }
            Err(panic) => {
                let e = PredictionError::Internal(panic_message(panic.as_ref()));
                error!("Error predicting word '{}': {}", word, e);
                WordPrediction::failed(word, format!("Prediction error: {}", e))
            }
        }
    }

    /// Known words ranked by similarity to `word`.
    pub fn similar_words(&self, word: &str, max_results: usize) -> Vec<SimilarWord> {
        let min_score = self.ranker.config().min_score;
        self.ranker
            .rank_with(self.store.index(), word, max_results, min_score)
    }

    fn try_predict(&self, word: &str) -> Result<WordPrediction, PredictionError> {
        if self.store.exists(word) {
            let pronunciations = self.store.lookup(word).to_vec();
            debug!("'{}' found in lexicon", word);
            let notes = vec![format!(
                "Word is in the lexicon with {} pronunciation(s)",
                pronunciations.len()
            )];
            return Ok(WordPrediction {
                word: word.to_string(),
                status: ValidationStatus::Known,
                confidence_tier: ConfidenceTier::Excellent,
                confidence_score: 1.0,
                in_lexicon: true,
                pronunciations,
                g2p_available: false,
                g2p_pronunciation: None,
                g2p_confidence: None,
                similar_words: Vec::new(),
                recommendation: recommend(true, None, &[]),
                notes,
            });
        }

        let mut notes = Vec::new();
        let guess = self.g2p.predict(word)?;
        let mut score = match &guess {
            Some(g) => {
                notes.push("Pronunciation estimated by the G2P model".to_string());
                g.confidence
            }
            None => {
                notes.push("Word not in lexicon and no G2P estimate available".to_string());
                0.0
            }
        };

        let similar_words = self.ranker.rank(self.store.index(), word);
        if let Some(best) = similar_words.first() {
            score = (score + best.score * self.scoring.similarity_boost).min(1.0);
            notes.push(format!("Found {} similar word(s)", similar_words.len()));
        }

        let status = if guess.is_some() {
            ValidationStatus::Guessed
        } else {
            ValidationStatus::Unknown
        };
        let g2p_confidence = guess.as_ref().map(|g| g.confidence);

        Ok(WordPrediction {
            word: word.to_string(),
            status,
            confidence_tier: ConfidenceTier::from_score(score),
            confidence_score: score,
            in_lexicon: false,
            pronunciations: Vec::new(),
            g2p_available: guess.is_some(),
            recommendation: recommend(false, g2p_confidence, &similar_words),
            g2p_pronunciation: guess.map(|g| g.pronunciation),
            g2p_confidence,
            similar_words,
            notes,
        })
    }
}

/// Picks the recommendation by priority: lexicon, confident G2P, weaker
/// G2P, closest known word, rename.
pub fn recommend(in_lexicon: bool, g2p_confidence: Option<f64>, similar: &[SimilarWord]) -> String {
    if in_lexicon {
        return "Excellent: recognized perfectly, the word is in the lexicon".to_string();
    }
    match g2p_confidence {
        Some(c) if c > 0.7 => return "Good: pronunciation estimated with high confidence".to_string(),
        Some(c) if c > 0.5 => {
            return "Fair: pronunciation estimated, verify with a voice test".to_string()
        }
        _ => {}
    }
    if let Some(best) = similar.first() {
        return format!(
            "Suggestion: consider replacing with '{}' ({:.0}% similar)",
            best.word,
            best.score * 100.0
        );
    }
    "Problematic: hard to recognize, renaming recommended".to_string()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic during prediction".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CandidateStrategy, SimilarityConfig};
    use crate::core::g2p::{G2pGuess, LetterToPhoneme, NoG2p};
    use crate::core::lexicon::LexiconIndex;
    use crate::core::parser::parse_text;
    use crate::core::types::LexiconSource;
    use std::path::Path;

    fn store(body: &str) -> Arc<LexiconStore> {
        let parsed = parse_text(body.as_bytes(), Path::new("mem.txt")).unwrap();
        let index = LexiconIndex::from_parsed(LexiconSource::text("mem.txt"), parsed);
        Arc::new(LexiconStore::new(Arc::new(index)))
    }

    fn predictor(body: &str, g2p: Arc<dyn G2pModel>) -> WordPredictor {
        WordPredictor::new(store(body), g2p, &ValidatorConfig::default())
    }

    #[test]
    fn test_known_word_is_excellent() {
        let p = predictor("casa K AA Z AH\n", Arc::new(NoG2p)).predict("CASA");
        assert!(p.in_lexicon);
        assert_eq!(p.status, ValidationStatus::Known);
        assert_eq!(p.confidence_tier, ConfidenceTier::Excellent);
        assert_eq!(p.confidence_score, 1.0);
        assert_eq!(p.pronunciations, vec![vec!["K", "AA", "Z", "AH"]]);
        assert!(p.similar_words.is_empty());
        assert!(!p.g2p_available);
    }

    #[test]
    fn test_unknown_without_g2p_or_similar() {
        let p = predictor("casa K AA Z AH\n", Arc::new(NoG2p)).predict("zebra");
        assert_eq!(p.status, ValidationStatus::Unknown);
        assert_eq!(p.confidence_tier, ConfidenceTier::Unknown);
        assert_eq!(p.confidence_score, 0.0);
        assert!(p.recommendation.starts_with("Problematic"));
    }

    #[test]
    fn test_similarity_boost_without_g2p() {
        let p = predictor("luce L U CH E\n", Arc::new(NoG2p)).predict("luci");
        assert_eq!(p.similar_words.len(), 1);
        assert!((p.confidence_score - 0.75 * 0.3).abs() < 1e-9);
        assert_eq!(p.confidence_tier, ConfidenceTier::Unknown);
        assert_eq!(p.recommendation, "Suggestion: consider replacing with 'luce' (75% similar)");
    }

    #[test]
    fn test_placeholder_g2p_plus_boost() {
        let p = predictor("luce L U CH E\n", Arc::new(LetterToPhoneme::new(0.7))).predict("luci");
        assert_eq!(p.status, ValidationStatus::Guessed);
        assert!(p.g2p_available);
        assert_eq!(p.g2p_confidence, Some(0.7));
        assert_eq!(p.g2p_pronunciation, Some(vec!["l".into(), "u".into(), "k".into(), "i".into()]));
        assert!((p.confidence_score - (0.7 + 0.225)).abs() < 1e-9);
        assert_eq!(p.confidence_tier, ConfidenceTier::Good);
        // 0.7 is not above the high-confidence bar.
        assert!(p.recommendation.starts_with("Fair"));
    }

    #[test]
    fn test_score_is_capped_at_one() {
        let p = predictor("luce L U CH E\n", Arc::new(LetterToPhoneme::new(0.9))).predict("luci");
        assert_eq!(p.confidence_score, 1.0);
        assert_eq!(p.confidence_tier, ConfidenceTier::Excellent);
        assert!(!p.in_lexicon);
        assert!(p.recommendation.starts_with("Good"));
    }

    struct Failing;

    impl G2pModel for Failing {
        fn predict_pronunciation(&self, _word: &str) -> Result<Option<G2pGuess>, PredictionError> {
            Err(PredictionError::G2p("model file truncated".into()))
        }
    }

    struct Panicking;

    impl G2pModel for Panicking {
        fn predict_pronunciation(&self, _word: &str) -> Result<Option<G2pGuess>, PredictionError> {
            panic!("decoder exploded")
        }
    }

    #[test]
    fn test_g2p_error_becomes_unknown_prediction() {
        let p = predictor("casa K AA Z AH\n", Arc::new(Failing)).predict("zebra");
        assert_eq!(p.status, ValidationStatus::Error);
        assert_eq!(p.confidence_tier, ConfidenceTier::Unknown);
        assert!(p.notes[0].contains("model file truncated"));
    }

    #[test]
    fn test_g2p_panic_becomes_unknown_prediction() {
        let p = predictor("casa K AA Z AH\n", Arc::new(Panicking)).predict("zebra");
        assert_eq!(p.status, ValidationStatus::Error);
        assert!(p.notes[0].contains("decoder exploded"));
    }

    #[test]
    fn test_known_word_skips_failing_g2p() {
        let p = predictor("casa K AA Z AH\n", Arc::new(Failing)).predict("casa");
        assert_eq!(p.status, ValidationStatus::Known);
    }

    #[test]
    fn test_empty_lexicon() {
        let p = predictor("", Arc::new(NoG2p)).predict("casa");
        assert_eq!(p.confidence_tier, ConfidenceTier::Unknown);
        assert_eq!(p.confidence_score, 0.0);
        assert!(!p.in_lexicon);
        assert!(p.similar_words.is_empty());
    }

    #[test]
    fn test_similar_words_respects_max() {
        let config = ValidatorConfig {
            similarity: SimilarityConfig {
                strategy: CandidateStrategy::FullScan,
                ..SimilarityConfig::default()
            },
            ..ValidatorConfig::default()
        };
        let p = WordPredictor::new(store("casa A\ncase A\ncast A\n"), Arc::new(NoG2p), &config);
        assert_eq!(p.similar_words("cash", 2).len(), 2);
    }

    #[test]
    fn test_recommendation_priorities() {
        let similar = vec![SimilarWord { word: "luce".into(), score: 0.8 }];
        assert!(recommend(true, Some(0.9), &similar).starts_with("Excellent"));
        assert!(recommend(false, Some(0.71), &similar).starts_with("Good"));
        assert!(recommend(false, Some(0.6), &similar).starts_with("Fair"));
        assert!(recommend(false, Some(0.4), &similar).contains("'luce' (80% similar)"));
        assert!(recommend(false, None, &[]).starts_with("Problematic"));
    }
}
