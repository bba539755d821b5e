// File: src/core/lexicon.rs
//! The lexicon index and the store that answers membership queries.
//!
//! A [`LexiconIndex`] is built once from a single source and is immutable
//! afterwards. A [`LexiconStore`] shares the index behind an `Arc` and adds
//! the per-store lookup cache, so swapping models is just replacing one
//! `Arc` with another.

use crate::core::parser::{parse_source, ParsedLexicon};
use crate::core::trie::PrefixIndex;
use crate::core::types::{
    LexiconEntry, LexiconSource, LexiconStatistics, Pronunciation, SourceKind, WordId,
};
use crate::error::LexiconError;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LexiconIndex {
    source: LexiconSource,
    entries: Vec<LexiconEntry>,
    by_word: HashMap<String, WordId>,
    /// Lowercased word -> first entry folding to it.
    folded: HashMap<String, WordId>,
    words: HashSet<String>,
    prefixes: PrefixIndex,
    records: usize,
    skipped: usize,
}

impl LexiconIndex {
    /// Reads and indexes `source`.
    pub fn load(source: &LexiconSource) -> Result<Self, LexiconError> {
        let parsed = parse_source(&source.path, source.kind)?;
        let index = Self::from_parsed(source.clone(), parsed);
        info!(
            "Loaded {} words ({} pronunciations) from {} lexicon {}",
            index.len(),
            index.records,
            source.kind.as_str(),
            source.path.display()
        );
        Ok(index)
    }

    /// Like [`load`](Self::load), but rejects sources with fewer than
    /// `min_words` distinct words. Used for freshly materialized sources.
    pub fn load_verified(source: &LexiconSource, min_words: usize) -> Result<Self, LexiconError> {
        let index = Self::load(source)?;
        index.verify(min_words)?;
        Ok(index)
    }

    pub fn from_parsed(source: LexiconSource, parsed: ParsedLexicon) -> Self {
        Self::from_entries(source, parsed.entries, parsed.records, parsed.skipped)
    }

    pub fn from_entries(
        source: LexiconSource,
        entries: Vec<LexiconEntry>,
        records: usize,
        skipped: usize,
    ) -> Self {
        let mut by_word = HashMap::with_capacity(entries.len());
        let mut folded = HashMap::with_capacity(entries.len());
        let mut words = HashSet::with_capacity(entries.len());
        let mut prefixes = PrefixIndex::new();

        for (id, entry) in entries.iter().enumerate() {
            by_word.insert(entry.word.clone(), id);
            folded.entry(entry.word.to_lowercase()).or_insert(id);
            words.insert(entry.word.clone());
            prefixes.insert(&entry.word, id);
        }

        Self {
            source,
            entries,
            by_word,
            folded,
            words,
            prefixes,
            records,
            skipped,
        }
    }

    /// An index with no words, e.g. for an empty source.
    pub fn empty(source: LexiconSource) -> Self {
        Self::from_entries(source, Vec::new(), 0, 0)
    }

    pub fn verify(&self, min_words: usize) -> Result<(), LexiconError> {
        if self.len() < min_words {
            return Err(LexiconError::SourceCorrupt {
                path: self.source.path.clone(),
                reason: format!(
                    "only {} words, expected at least {}",
                    self.len(),
                    min_words
                ),
            });
        }
        Ok(())
    }

    pub fn source(&self) -> &LexiconSource {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LexiconEntry] {
        &self.entries
    }

    pub fn entry(&self, id: WordId) -> &LexiconEntry {
        &self.entries[id]
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Resolves `word` to an entry: case variants first, in preference
    /// order, then a case-folded match.
    pub fn resolve(&self, word: &str) -> Option<WordId> {
        word_variants(word)
            .iter()
            .find_map(|variant| self.by_word.get(variant).copied())
            .or_else(|| self.folded.get(&word.to_lowercase()).copied())
    }

    pub fn exists(&self, word: &str) -> bool {
        self.resolve(word).is_some()
    }

    /// Stored pronunciations, or an empty slice when the word is unknown.
    pub fn lookup(&self, word: &str) -> &[Pronunciation] {
        match self.resolve(word) {
            Some(id) => &self.entries[id].pronunciations,
            None => &[],
        }
    }

    /// The full vocabulary, exactly as spelled in the source.
    pub fn all_words(&self) -> &HashSet<String> {
        &self.words
    }

    /// Ids of words starting with `prefix`, case-insensitively.
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<WordId> {
        self.prefixes.words_with_prefix(prefix)
    }

    pub fn statistics(&self, sample_size: usize) -> LexiconStatistics {
        let total_words = self.len();
        let total_pronunciations: usize =
            self.entries.iter().map(|e| e.pronunciations.len()).sum();
        let avg = if total_words > 0 {
            (total_pronunciations as f64 / total_words as f64 * 100.0).round() / 100.0
        } else {
            0.0
        };

        LexiconStatistics {
            total_words,
            total_pronunciations,
            avg_pronunciations_per_word: avg,
            sample_words: self
                .entries
                .iter()
                .take(sample_size)
                .map(|e| e.word.clone())
                .collect(),
            source_kind: self.source.kind,
            optimized_format: self.source.kind == SourceKind::Text,
            source_path: self.source.path.clone(),
            skipped_lines: self.skipped,
        }
    }
}

/// Case variants probed for a lookup, in preference order: as given,
/// lowercase, uppercase, title case. Duplicates are dropped.
pub fn word_variants(word: &str) -> Vec<String> {
    let candidates = [
        word.to_string(),
        word.to_lowercase(),
        word.to_uppercase(),
        title_case(word),
    ];
    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

/// Uppercases the first letter of every alphabetic run, lowercases the rest.
fn title_case(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut in_word = false;
    for c in word.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphabetic();
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CachedLookup {
    Found(WordId),
    Missing,
}

/// Entries a lookup or G2P cache holds before it is emptied.
pub const DEFAULT_CACHE_CAPACITY: usize = 100_000;

/// A loaded lexicon plus its lookup cache.
///
/// The cache maps a queried word, exactly as given, to its resolution,
/// including an explicit "no pronunciation" marker. Concurrent writers race
/// benignly: the value for a word is always the same.
///
/// The cache is bounded: once it holds `capacity` entries it is cleared
/// before the next insert, so a long-running process with an open-ended
/// query stream stays within `capacity` entries.
#[derive(Debug)]
pub struct LexiconStore {
    index: Arc<LexiconIndex>,
    cache: DashMap<String, CachedLookup>,
    capacity: usize,
}

impl LexiconStore {
    pub fn new(index: Arc<LexiconIndex>) -> Self {
        Self::with_capacity(index, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(index: Arc<LexiconIndex>, capacity: usize) -> Self {
        Self { index, cache: DashMap::new(), capacity: capacity.max(1) }
    }

    pub fn load(source: &LexiconSource) -> Result<Self, LexiconError> {
        Ok(Self::new(Arc::new(LexiconIndex::load(source)?)))
    }

    pub fn index(&self) -> &Arc<LexiconIndex> {
        &self.index
    }

    fn resolve_cached(&self, word: &str) -> Option<WordId> {
        if let Some(hit) = self.cache.get(word) {
            debug!("Lookup cache hit for '{}'", word);
            return match *hit {
                CachedLookup::Found(id) => Some(id),
                CachedLookup::Missing => None,
            };
        }

        let resolved = self.index.resolve(word);
        let value = resolved.map_or(CachedLookup::Missing, CachedLookup::Found);
        if self.cache.len() >= self.capacity {
            debug!("Lookup cache full at {} entries, clearing", self.capacity);
            self.cache.clear();
        }
        self.cache.insert(word.to_string(), value);
        resolved
    }

    pub fn exists(&self, word: &str) -> bool {
        self.resolve_cached(word).is_some()
    }

    pub fn lookup(&self, word: &str) -> &[Pronunciation] {
        match self.resolve_cached(word) {
            Some(id) => &self.index.entry(id).pronunciations,
            None => &[],
        }
    }

    pub fn all_words(&self) -> &HashSet<String> {
        self.index.all_words()
    }

    pub fn statistics(&self, sample_size: usize) -> LexiconStatistics {
        self.index.statistics(sample_size)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("Cleared lookup cache");
    }
}
