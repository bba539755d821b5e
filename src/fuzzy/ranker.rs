// File: src/fuzzy/ranker.rs
use crate::config::{CandidateStrategy, SimilarityConfig};
use crate::core::lexicon::LexiconIndex;
use crate::core::types::SimilarWord;
use crate::fuzzy::similarity::similarity;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Ranks known words by orthographic closeness to a target word.
#[derive(Debug, Clone, Default)]
pub struct SimilarityRanker {
    config: SimilarityConfig,
}

impl SimilarityRanker {
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Top `max_results` (configured) words of `index` scoring strictly
    /// above `min_score`, best first.
    pub fn rank(&self, index: &LexiconIndex, target: &str) -> Vec<SimilarWord> {
        self.rank_with(index, target, self.config.max_results, self.config.min_score)
    }

    pub fn rank_with(
        &self,
        index: &LexiconIndex,
        target: &str,
        max_results: usize,
        min_score: f64,
    ) -> Vec<SimilarWord> {
        let target = target.to_lowercase();
        if target.is_empty() || index.is_empty() || max_results == 0 {
            return Vec::new();
        }

        let scored: Vec<SimilarWord> = match self.config.strategy {
            CandidateStrategy::Prefix => {
                let prefix: String = target.chars().take(self.config.prefix_len).collect();
                index
                    .words_with_prefix(&prefix)
                    .into_iter()
                    .filter_map(|id| score_candidate(&target, &index.entry(id).word, min_score))
                    .collect()
            }
            CandidateStrategy::FullScan => index
                .entries()
                .par_iter()
                .filter_map(|entry| score_candidate(&target, &entry.word, min_score))
                .collect(),
        };

        top_k(scored, max_results)
    }
}

/// Ranks an arbitrary candidate list. The target itself (case-insensitively)
/// is never part of its own result.
pub fn rank_candidates<'a, I>(
    target: &str,
    candidates: I,
    max_results: usize,
    min_score: f64,
) -> Vec<SimilarWord>
where
    I: IntoIterator<Item = &'a str>,
{
    let target = target.to_lowercase();
    if target.is_empty() {
        return Vec::new();
    }
    let scored = candidates
        .into_iter()
        .filter_map(|candidate| score_candidate(&target, candidate, min_score))
        .collect();
    top_k(scored, max_results)
}

/// `target` must already be lowercased.
fn score_candidate(target: &str, candidate: &str, min_score: f64) -> Option<SimilarWord> {
    let folded = candidate.to_lowercase();
    if folded == target {
        return None;
    }
    let score = similarity(target, &folded);
    (score > min_score).then(|| SimilarWord { word: candidate.to_string(), score })
}

/// Sorts by score descending, ties by word, and keeps the first `k`.
fn top_k(mut scored: Vec<SimilarWord>, k: usize) -> Vec<SimilarWord> {
    scored.sort_by(|a, b| match b.score.total_cmp(&a.score) {
        Ordering::Equal => a.word.cmp(&b.word),
        other => other,
    });
    scored.truncate(k);
    scored
}
