// File: src/core/engine.rs
use crate::config::ValidatorConfig;
use crate::core::g2p::{G2pModel, LetterToPhoneme, NoG2p};
use crate::core::lexicon::{LexiconIndex, LexiconStore};
use crate::core::model::ModelInfo;
use crate::core::types::{
    ConfidenceTier, EngineStatistics, EntityPrediction, LexiconSource, SimilarWord,
    ValidationReport, WordPrediction,
};
use crate::error::EngineError;
use crate::persistence::load_snapshot;
use crate::predict::entity::{build_report, EntityAggregator};
use crate::predict::word::WordPredictor;
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};

const NO_MODEL_NOTE: &str = "No lexicon model is active";

/// One activated model: its descriptor plus the predictor bound to its
/// lexicon. Never mutated after construction.
#[derive(Debug)]
struct ActiveModel {
    model: ModelInfo,
    predictor: WordPredictor,
}

/// The validator facade. Holds at most one active model; activating another
/// one replaces it wholesale.
///
/// The active model sits behind an `Arc`, so a request that already grabbed
/// it keeps a consistent view while a switch publishes the next one.
pub struct ValidatorEngine {
    config: ValidatorConfig,
    active: RwLock<Option<Arc<ActiveModel>>>,
}

impl ValidatorEngine {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config, active: RwLock::new(None) }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Loads the model's lexicon and makes it the active model. On failure
    /// the previously active model, if any, stays in place.
    #[instrument(skip(self, model), fields(model_id = %model.id))]
    pub fn activate(&self, model: ModelInfo) -> Result<(), EngineError> {
        let source = model
            .lexicon
            .clone()
            .ok_or_else(|| EngineError::NoLexicon { model_id: model.id.clone() })?;
        let index = LexiconIndex::load(&source)?;
        self.publish(model, index);
        Ok(())
    }

    /// Activates a model from a compiled snapshot instead of its raw source.
    pub fn activate_snapshot(&self, model: ModelInfo, snapshot: &Path) -> Result<(), EngineError> {
        let index = load_snapshot(snapshot, self.config.verification.min_word_count)?;
        self.publish(model, index);
        Ok(())
    }

    /// Activates a bare lexicon source with no surrounding model.
    pub fn set_lexicon(&self, source: LexiconSource) -> Result<(), EngineError> {
        self.activate(ModelInfo::for_source(source))
    }

    fn publish(&self, model: ModelInfo, index: LexiconIndex) {
        let store = Arc::new(LexiconStore::with_capacity(
            Arc::new(index),
            self.config.cache.max_entries,
        ));
        let g2p = self.g2p_for(&model);
        let predictor = WordPredictor::new(store, g2p, &self.config);

        info!(
            "Activated model {} ({} words, G2P {})",
            model.id,
            predictor.store().index().len(),
            if predictor.g2p_available() { "enabled" } else { "disabled" }
        );

        let next = Arc::new(ActiveModel { model, predictor });
        let mut guard = self.active.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(next);
    }

    fn g2p_for(&self, model: &ModelInfo) -> Arc<dyn G2pModel> {
        let confidence = self.config.g2p.placeholder_confidence;
        if let Some(path) = model.g2p_artifact() {
            info!("Using G2P artifact {}", path.display());
            return Arc::new(LetterToPhoneme::new(confidence));
        }
        if self.config.g2p.always_enabled {
            return Arc::new(LetterToPhoneme::new(confidence));
        }
        warn!("Model {} has no G2P artifact, unknown words get no estimate", model.id);
        Arc::new(NoG2p)
    }

    fn current(&self) -> Option<Arc<ActiveModel>> {
        self.active
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }

    pub fn model_id(&self) -> Option<String> {
        self.current().map(|active| active.model.id.clone())
    }

    pub fn model(&self) -> Option<ModelInfo> {
        self.current().map(|active| active.model.clone())
    }

    pub fn validate_word(&self, word: &str) -> WordPrediction {
        match self.current() {
            Some(active) => active.predictor.predict(word),
            None => WordPrediction::failed(word, NO_MODEL_NOTE.to_string()),
        }
    }

    pub fn validate_entity(&self, name: &str) -> EntityPrediction {
        match self.current() {
            Some(active) => EntityAggregator::new(&active.predictor).predict(name),
            None => inactive_entity(name),
        }
    }

    /// Validates a batch of entity names against one consistent model.
    pub fn validate_entities<S: AsRef<str>>(&self, names: &[S]) -> ValidationReport {
        match self.current() {
            Some(active) => {
                let aggregator = EntityAggregator::new(&active.predictor);
                let results = names
                    .iter()
                    .map(|name| aggregator.predict(name.as_ref()))
                    .collect();
                build_report(&active.model.id, results)
            }
            None => build_report(
                "",
                names.iter().map(|name| inactive_entity(name.as_ref())).collect(),
            ),
        }
    }

    /// Ranked known words close to `word`. Empty when no model is active.
    pub fn suggest_alternatives(&self, word: &str, max_results: usize) -> Vec<SimilarWord> {
        self.current()
            .map(|active| active.predictor.similar_words(word, max_results))
            .unwrap_or_default()
    }

    pub fn statistics(&self) -> Option<EngineStatistics> {
        let active = self.current()?;
        let store = active.predictor.store();
        Some(EngineStatistics {
            model_id: active.model.id.clone(),
            lexicon: store.statistics(self.config.statistics.sample_size),
            g2p_available: active.predictor.g2p_available(),
            lookup_cache_entries: store.cache_len(),
            g2p_cache_entries: active.predictor.g2p_cache_len(),
        })
    }

    pub fn clear_caches(&self) {
        if let Some(active) = self.current() {
            active.predictor.clear_caches();
            info!("Cleared caches for model {}", active.model.id);
        }
    }
}

impl Default for ValidatorEngine {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

fn inactive_entity(name: &str) -> EntityPrediction {
    EntityPrediction {
        entity_name: name.to_string(),
        word_predictions: Vec::new(),
        overall_tier: ConfidenceTier::Unknown,
        overall_score: 0.0,
        recognition_percentage: 0.0,
        recommendations: vec![NO_MODEL_NOTE.to_string()],
        suggested_alternatives: Vec::new(),
    }
}
