// File: src/core/model.rs
use crate::core::types::LexiconSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Read-only descriptor of one speech model, as handed over by the model
/// management layer. The validator never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub language: String,
    pub language_family: String,
    pub description: String,
    pub model_path: PathBuf,
    pub lexicon: Option<LexiconSource>,
    pub g2p_path: Option<PathBuf>,
}

impl ModelInfo {
    /// Builds a descriptor from a model id such as `it_IT-rhasspy`.
    pub fn new(id: &str, model_path: impl Into<PathBuf>) -> Self {
        let (language, language_family) = parse_language(id);
        Self {
            id: id.to_string(),
            description: format!("{} speech model", language),
            language,
            language_family,
            model_path: model_path.into(),
            lexicon: None,
            g2p_path: None,
        }
    }

    /// A descriptor for a bare lexicon file with no surrounding model.
    pub fn for_source(source: LexiconSource) -> Self {
        let id = source
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("lexicon")
            .to_string();
        let model_path = source
            .path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        Self::new(&id, model_path).with_lexicon(source)
    }

    pub fn with_lexicon(mut self, source: LexiconSource) -> Self {
        self.lexicon = Some(source);
        self
    }

    pub fn with_g2p(mut self, path: impl Into<PathBuf>) -> Self {
        self.g2p_path = Some(path.into());
        self
    }

    /// The G2P artifact, if declared and present on disk.
    pub fn g2p_artifact(&self) -> Option<&PathBuf> {
        self.g2p_path.as_ref().filter(|p| p.exists())
    }
}

/// `en_US-rhasspy` -> (`en_US`, `en`); ids without a locale fall back to
/// their first dash-separated part for both.
fn parse_language(id: &str) -> (String, String) {
    let head = id.split('-').next().unwrap_or(id);
    let family = head.split('_').next().unwrap_or(head);
    (head.to_string(), family.to_string())
}
