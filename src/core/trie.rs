// --- File: src/core/trie.rs
use crate::core::types::WordId;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
struct PrefixNode {
    children: HashMap<char, usize>,
    /// Several source words can fold to the same lowercase key.
    word_ids: Vec<WordId>,
}

/// A character trie over lowercased words, used to restrict similarity
/// candidates to words sharing the target's first characters.
///
/// Built once alongside the lexicon index and never mutated afterwards.
#[derive(Clone, Debug)]
pub struct PrefixIndex {
    nodes: Vec<PrefixNode>,
    len: usize,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self { nodes: vec![PrefixNode::default()], len: 0 }
    }

    /// Inserts `word` (lowercased) mapping to `word_id`.
    /// O(k) complexity where k is the word length in characters.
    pub fn insert(&mut self, word: &str, word_id: WordId) {
        let mut node_idx = 0;
        for c in word.chars().flat_map(char::to_lowercase) {
            node_idx = match self.nodes[node_idx].children.get(&c) {
                Some(&id) => id,
                None => {
                    let new_node_id = self.nodes.len();
                    self.nodes.push(PrefixNode::default());
                    self.nodes[node_idx].children.insert(c, new_node_id);
                    new_node_id
                }
            };
        }
        self.nodes[node_idx].word_ids.push(word_id);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All word ids whose lowercased form starts with `prefix`
    /// (matched case-insensitively). An empty prefix yields every word.
    pub fn words_with_prefix(&self, prefix: &str) -> Vec<WordId> {
        let mut node_idx = 0;
        for c in prefix.chars().flat_map(char::to_lowercase) {
            match self.nodes[node_idx].children.get(&c) {
                Some(&next_idx) => node_idx = next_idx,
                None => return Vec::new(),
            }
        }

        let mut found = Vec::new();
        let mut stack = vec![node_idx];
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            found.extend_from_slice(&node.word_ids);
            stack.extend(node.children.values().copied());
        }
        found
    }
}
