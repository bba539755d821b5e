// src/fuzzy/mod.rs
pub mod ranker;
pub mod similarity;
