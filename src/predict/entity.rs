// File: src/predict/entity.rs
//! Entity names are validated token by token, then folded into one verdict.

use crate::core::types::{
    ConfidenceTier, EntityPrediction, ValidationReport, WordPrediction,
};
use crate::predict::word::WordPredictor;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[_\-\s]+").unwrap());

/// Score at or above which a token counts as recognizable.
const RECOGNIZED_SCORE: f64 = 0.7;
const MAX_ALTERNATIVES: usize = 3;

/// Lowercased tokens of an identifier together with the separators that
/// joined them, so alternatives can be rebuilt in the same shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTokens {
    pub tokens: Vec<String>,
    /// `separators[i]` sits between `tokens[i]` and `tokens[i + 1]`.
    pub separators: Vec<String>,
    /// Some separator between two tokens contains `_`.
    pub has_underscore: bool,
}

impl EntityTokens {
    pub fn parse(name: &str) -> Self {
        let mut tokens = Vec::new();
        let mut separators = Vec::new();
        let mut pending_sep: Option<&str> = None;
        let mut last = 0;

        let mut push_token = |token: &str, pending: Option<&str>, tokens: &mut Vec<String>| {
            if token.is_empty() {
                return;
            }
            if !tokens.is_empty() {
                separators.push(pending.unwrap_or(" ").to_string());
            }
            tokens.push(token.to_lowercase());
        };

        for m in SEPARATORS.find_iter(name) {
            push_token(&name[last..m.start()], pending_sep, &mut tokens);
            pending_sep = Some(m.as_str());
            last = m.end();
        }
        push_token(&name[last..], pending_sep, &mut tokens);

        let has_underscore = separators.iter().any(|s| s.contains('_'));
        Self { tokens, separators, has_underscore }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Rejoins the tokens, optionally substituting token `index`.
    pub fn rebuild(&self, replace: Option<(usize, &str)>) -> String {
        let mut out = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push_str(&self.separators[i - 1]);
            }
            match replace {
                Some((idx, word)) if idx == i => out.push_str(word),
                _ => out.push_str(token),
            }
        }
        out
    }
}

/// Fans an entity name out to the word predictor and folds the results.
pub struct EntityAggregator<'p> {
    predictor: &'p WordPredictor,
}

impl<'p> EntityAggregator<'p> {
    pub fn new(predictor: &'p WordPredictor) -> Self {
        Self { predictor }
    }

    #[instrument(skip(self))]
    pub fn predict(&self, entity_name: &str) -> EntityPrediction {
        let tokens = EntityTokens::parse(entity_name);
        if tokens.is_empty() {
            debug!("No tokens in entity name {:?}", entity_name);
            return EntityPrediction {
                entity_name: entity_name.to_string(),
                word_predictions: Vec::new(),
                overall_tier: ConfidenceTier::Unknown,
                overall_score: 0.0,
                recognition_percentage: 0.0,
                recommendations: vec!["Entity name contains no words to analyze".to_string()],
                suggested_alternatives: Vec::new(),
            };
        }

        let word_predictions: Vec<WordPrediction> = tokens
            .tokens
            .iter()
            .map(|token| self.predictor.predict(token))
            .collect();

        let count = word_predictions.len() as f64;
        let overall_score =
            word_predictions.iter().map(|p| p.confidence_score).sum::<f64>() / count;
        let recognized = word_predictions
            .iter()
            .filter(|p| p.confidence_score >= RECOGNIZED_SCORE)
            .count() as f64;

        EntityPrediction {
            entity_name: entity_name.to_string(),
            overall_tier: ConfidenceTier::from_score(overall_score),
            overall_score,
            recognition_percentage: recognized / count * 100.0,
            recommendations: entity_recommendations(&word_predictions, overall_score),
            suggested_alternatives: suggest_alternatives(&tokens, &word_predictions),
            word_predictions,
        }
    }
}

fn entity_recommendations(predictions: &[WordPrediction], overall_score: f64) -> Vec<String> {
    let mut recommendations = Vec::new();

    let unknown: Vec<&str> = predictions
        .iter()
        .filter(|p| p.confidence_tier == ConfidenceTier::Unknown)
        .map(|p| p.word.as_str())
        .collect();
    let poor = predictions
        .iter()
        .filter(|p| p.confidence_tier == ConfidenceTier::Poor)
        .count();
    let estimated = predictions
        .iter()
        .filter(|p| p.g2p_available && !p.in_lexicon)
        .count();

    if !unknown.is_empty() {
        recommendations.push(format!(
            "{} word(s) not recognizable: {}",
            unknown.len(),
            unknown.join(", ")
        ));
    }
    if poor > 0 {
        recommendations.push(format!("{} problematic word(s), consider renaming", poor));
    }
    if estimated > 0 {
        recommendations.push(format!(
            "{} word(s) use an estimated pronunciation, verify with a voice test",
            estimated
        ));
    }

    let summary = if overall_score >= 0.9 {
        "Excellent entity name for voice recognition"
    } else if overall_score >= 0.7 {
        "Good entity name, should be recognized well"
    } else if overall_score >= 0.5 {
        "Mediocre entity name, recognition problems are possible"
    } else {
        "Poor entity name, renaming strongly recommended"
    };
    recommendations.push(summary.to_string());
    recommendations
}

fn suggest_alternatives(tokens: &EntityTokens, predictions: &[WordPrediction]) -> Vec<String> {
    let mut alternatives = Vec::new();

    for (i, prediction) in predictions.iter().enumerate() {
        if !prediction.confidence_tier.is_problematic() {
            continue;
        }
        if let Some(best) = prediction.best_match() {
            alternatives.push(format!(
                "{} (replace '{}' with '{}')",
                tokens.rebuild(Some((i, &best.word))),
                prediction.word,
                best.word
            ));
        }
    }

    if tokens.has_underscore {
        alternatives.push(format!(
            "{} (use spaces instead of underscores)",
            tokens.tokens.join(" ")
        ));
    }

    if tokens.tokens.len() > 2 {
        if let (Some(first), Some(last)) = (tokens.tokens.first(), tokens.tokens.last()) {
            alternatives.push(format!(
                "{} {} (consider abbreviating to fewer words)",
                first, last
            ));
        }
    }

    alternatives.truncate(MAX_ALTERNATIVES);
    alternatives
}

/// Summarizes a batch of entity predictions.
///
/// An entity is known when every token is in the lexicon, unknown when any
/// token (or the name itself) is unrecognizable, and partially known
/// otherwise.
pub fn build_report(model_id: &str, entity_results: Vec<EntityPrediction>) -> ValidationReport {
    let mut known = 0;
    let mut unknown = 0;
    let mut partial = 0;

    for result in &entity_results {
        let preds = &result.word_predictions;
        if !preds.is_empty() && preds.iter().all(|p| p.in_lexicon) {
            known += 1;
        } else if preds.is_empty()
            || preds
                .iter()
                .any(|p| p.confidence_tier == ConfidenceTier::Unknown)
        {
            unknown += 1;
        } else {
            partial += 1;
        }
    }

    let total = entity_results.len();
    let overall_score = if total > 0 { known as f64 / total as f64 } else { 0.0 };

    let mut recommendations = Vec::new();
    if unknown > 0 {
        recommendations.push(format!("{} entities contain unrecognized words", unknown));
    }
    if partial > 0 {
        recommendations.push(format!(
            "{} entities rely on estimated or approximate pronunciations",
            partial
        ));
    }
    if overall_score < 0.8 {
        recommendations.push("Consider renaming entities using more common words".to_string());
    }

    ValidationReport {
        model_id: model_id.to_string(),
        total_entities: total,
        known_entities: known,
        unknown_entities: unknown,
        partially_known_entities: partial,
        entity_results,
        overall_score,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::core::g2p::{LetterToPhoneme, NoG2p};
    use crate::core::lexicon::{LexiconIndex, LexiconStore};
    use crate::core::parser::parse_text;
    use crate::core::types::LexiconSource;
    use std::path::Path;
    use std::sync::Arc;

    const LEXICON: &str = "luce L U CH E\nluci L U CH I\nsala S A L A\ncucina K U CH I N A\n";

    fn predictor(g2p: bool) -> WordPredictor {
        let parsed = parse_text(LEXICON.as_bytes(), Path::new("mem.txt")).unwrap();
        let index = LexiconIndex::from_parsed(LexiconSource::text("mem.txt"), parsed);
        let store = Arc::new(LexiconStore::new(Arc::new(index)));
        if g2p {
            WordPredictor::new(store, Arc::new(LetterToPhoneme::default()), &ValidatorConfig::default())
        } else {
            WordPredictor::new(store, Arc::new(NoG2p), &ValidatorConfig::default())
        }
    }

    #[test]
    fn test_tokenize_separators() {
        let t = EntityTokens::parse("Luce_Sala-grande  cucina");
        assert_eq!(t.tokens, vec!["luce", "sala", "grande", "cucina"]);
        assert_eq!(t.separators, vec!["_", "-", "  "]);
        assert!(t.has_underscore);
    }

    #[test]
    fn test_tokenize_drops_empty_tokens() {
        let t = EntityTokens::parse("__luce--sala__");
        assert_eq!(t.tokens, vec!["luce", "sala"]);
        assert_eq!(t.separators, vec!["--"]);
        assert!(!t.has_underscore);
        assert!(EntityTokens::parse(" _-_ ").is_empty());
        assert!(EntityTokens::parse("").is_empty());
    }

    #[test]
    fn test_edge_underscores_get_no_spacing_advice() {
        let p = predictor(false);
        let e = EntityAggregator::new(&p).predict("luce_");
        assert_eq!(e.word_predictions.len(), 1);
        assert!(e.suggested_alternatives.is_empty());

        let e = EntityAggregator::new(&p).predict("_luce sala_");
        assert!(e
            .suggested_alternatives
            .iter()
            .all(|alt| !alt.contains("underscores")));
    }

    #[test]
    fn test_rebuild_with_replacement() {
        let t = EntityTokens::parse("luce_salx");
        assert_eq!(t.rebuild(None), "luce_salx");
        assert_eq!(t.rebuild(Some((1, "sala"))), "luce_sala");
    }

    #[test]
    fn test_all_known_entity() {
        let p = predictor(false);
        let e = EntityAggregator::new(&p).predict("Luce_Sala");
        assert_eq!(e.word_predictions.len(), 2);
        assert_eq!(e.overall_score, 1.0);
        assert_eq!(e.overall_tier, ConfidenceTier::Excellent);
        assert_eq!(e.recognition_percentage, 100.0);
        assert_eq!(
            e.recommendations.last().map(String::as_str),
            Some("Excellent entity name for voice recognition")
        );
        assert_eq!(e.suggested_alternatives, vec!["luce sala (use spaces instead of underscores)"]);
    }

    #[test]
    fn test_overall_score_is_mean() {
        let p = predictor(false);
        let e = EntityAggregator::new(&p).predict("luce_sconosciuta");
        let mean = e.word_predictions.iter().map(|w| w.confidence_score).sum::<f64>() / 2.0;
        assert!((e.overall_score - mean).abs() < 1e-9);
        assert_eq!(e.word_predictions[0].confidence_score, 1.0);
        assert!(!e.word_predictions[1].in_lexicon);
        assert_eq!(e.recognition_percentage, 50.0);
    }

    #[test]
    fn test_alternatives_substitute_best_match() {
        let p = predictor(false);
        let e = EntityAggregator::new(&p).predict("salx-cucina");
        assert_eq!(e.word_predictions[0].confidence_tier, ConfidenceTier::Unknown);
        assert_eq!(
            e.suggested_alternatives[0],
            "sala-cucina (replace 'salx' with 'sala')"
        );
        assert_eq!(e.suggested_alternatives.len(), 1);
        assert!(e.recommendations[0].starts_with("1 word(s) not recognizable: salx"));
    }

    #[test]
    fn test_alternatives_capped_at_three() {
        let p = predictor(false);
        let e = EntityAggregator::new(&p).predict("lucx_salx_cucinx_sola");
        assert_eq!(e.suggested_alternatives.len(), 3);
        assert!(e.suggested_alternatives[0].starts_with("luce_salx_cucinx_sola"));
    }

    #[test]
    fn test_g2p_tokens_are_reported() {
        let p = predictor(true);
        let e = EntityAggregator::new(&p).predict("luce_tavolo");
        assert!(e.recommendations.iter().any(|r| r.contains("estimated pronunciation")));
    }

    #[test]
    fn test_empty_entity_is_unknown() {
        let p = predictor(false);
        let e = EntityAggregator::new(&p).predict("__");
        assert_eq!(e.overall_tier, ConfidenceTier::Unknown);
        assert_eq!(e.overall_score, 0.0);
        assert!(e.word_predictions.is_empty());
        assert_eq!(e.recommendations.len(), 1);
    }

    #[test]
    fn test_report_classification() {
        let p = predictor(true);
        let agg = EntityAggregator::new(&p);
        let results = vec![
            agg.predict("luce_sala"),
            agg.predict("luce_tavolo"),
            agg.predict("hhh"),
            agg.predict(""),
        ];
        let report = build_report("it_IT-test", results);
        assert_eq!(report.total_entities, 4);
        assert_eq!(report.known_entities, 1);
        assert_eq!(report.partially_known_entities, 1);
        assert_eq!(report.unknown_entities, 2);
        assert_eq!(report.overall_score, 0.25);
        assert_eq!(report.recommendations.len(), 3);
    }

    #[test]
    fn test_empty_report() {
        let report = build_report("m", Vec::new());
        assert_eq!(report.overall_score, 0.0);
        assert_eq!(report.total_entities, 0);
    }
}
