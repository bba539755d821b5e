// src/core/mod.rs
pub mod engine;
pub mod g2p;
pub mod lexicon;
pub mod model;
pub mod parser;
pub mod trie;
pub mod types;
