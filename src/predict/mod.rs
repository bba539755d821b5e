// src/predict/mod.rs
pub mod entity;
pub mod word;
