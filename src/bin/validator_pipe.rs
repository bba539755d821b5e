// src/bin/validator_pipe.rs
//! Line protocol for an external front end.
//!
//! Reads one JSON request per stdin line and writes exactly one JSON
//! response per line to stdout. Logs go to stderr.
//!
//! ```text
//! -> {"op":"load","path":"/models/it_IT/lexicon.txt","g2p":"/models/it_IT/g2p.fst"}
//! <- {"ok":true,"result":{"model_id":"lexicon"}}
//! -> {"op":"word","word":"casa"}
//! <- {"ok":true,"result":{"word":"casa","status":"known",...}}
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use validator_core::core::types::SourceKind;
use validator_core::{LexiconSource, ModelInfo, ValidatorConfig, ValidatorEngine};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    Load {
        path: PathBuf,
        #[serde(default)]
        kind: Option<SourceKind>,
        #[serde(default)]
        model_id: Option<String>,
        #[serde(default)]
        g2p: Option<PathBuf>,
    },
    Word {
        word: String,
    },
    Entity {
        name: String,
    },
    Entities {
        names: Vec<String>,
    },
    Similar {
        word: String,
        #[serde(default)]
        max_results: Option<usize>,
    },
    Stats,
    ClearCache,
    Exit,
}

#[derive(Debug, Serialize)]
struct Response {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Response {
    fn ok(result: Value) -> Self {
        Self { ok: true, result: Some(result), error: None }
    }

    fn err(message: impl Into<String>) -> Self {
        Self { ok: false, result: None, error: Some(message.into()) }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ValidatorConfig::from_file(Path::new(&path))
            .with_context(|| format!("loading config {}", path))?,
        None => ValidatorConfig::default(),
    };
    let engine = ValidatorEngine::new(config);

    info!("Validator pipe ready");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let input = line?;
        if input.trim().is_empty() {
            continue;
        }
        debug!("<- {}", input);

        let (response, exit) = respond(&engine, &input);
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
        if exit {
            break;
        }
    }

    info!("Validator pipe shutting down");
    Ok(())
}

/// Answers one request line. The flag is set when the client asked to exit.
fn respond(engine: &ValidatorEngine, line: &str) -> (Response, bool) {
    match serde_json::from_str::<Request>(line) {
        Ok(Request::Exit) => (Response::ok(json!("bye")), true),
        Ok(request) => (handle(engine, request), false),
        Err(e) => {
            warn!("Malformed request: {}", e);
            (Response::err(format!("malformed request: {}", e)), false)
        }
    }
}

fn handle(engine: &ValidatorEngine, request: Request) -> Response {
    match request {
        Request::Load { path, kind, model_id, g2p } => {
            let kind = kind.unwrap_or_else(|| SourceKind::from_path(&path));
            let source = LexiconSource::new(path, kind);
            let mut model = match model_id {
                Some(id) => ModelInfo::new(&id, source.path.parent().unwrap_or(&source.path))
                    .with_lexicon(source),
                None => ModelInfo::for_source(source),
            };
            if let Some(g2p) = g2p {
                model = model.with_g2p(g2p);
            }
            match engine.activate(model) {
                Ok(()) => Response::ok(json!({ "model_id": engine.model_id() })),
                Err(e) if e.is_corrupt() => Response::err(format!("model unusable: {}", e)),
                Err(e) => Response::err(e.to_string()),
            }
        }
        Request::Word { word } => to_response(&engine.validate_word(&word)),
        Request::Entity { name } => to_response(&engine.validate_entity(&name)),
        Request::Entities { names } => to_response(&engine.validate_entities(&names)),
        Request::Similar { word, max_results } => {
            let max = max_results.unwrap_or(engine.config().similarity.max_results);
            to_response(&engine.suggest_alternatives(&word, max))
        }
        Request::Stats => match engine.statistics() {
            Some(stats) => to_response(&stats),
            None => Response::err("no model is active"),
        },
        Request::ClearCache => {
            engine.clear_caches();
            Response::ok(json!("cleared"))
        }
        Request::Exit => Response::ok(json!("bye")),
    }
}

fn to_response<T: Serialize>(value: &T) -> Response {
    match serde_json::to_value(value) {
        Ok(v) => Response::ok(v),
        Err(e) => Response::err(format!("failed to encode response: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const LEXICON: &str = "casa K AA Z AH\ncase K AA Z E\nluce L U CH E\nsala S A L A\n";

    fn send(engine: &ValidatorEngine, line: &str) -> Response {
        let (response, exit) = respond(engine, line);
        assert!(!exit);
        response
    }

    fn load_line(path: &Path) -> String {
        json!({ "op": "load", "path": path }).to_string()
    }

    #[test]
    fn test_every_op_parses() {
        let lines = [
            r#"{"op":"load","path":"/m/lexicon.db","kind":"tabular","model_id":"it_IT-x","g2p":"/m/g2p.fst"}"#,
            r#"{"op":"load","path":"/m/lexicon.txt"}"#,
            r#"{"op":"word","word":"casa"}"#,
            r#"{"op":"entity","name":"luce_sala"}"#,
            r#"{"op":"entities","names":["luce_sala","casa"]}"#,
            r#"{"op":"similar","word":"cas","max_results":2}"#,
            r#"{"op":"similar","word":"cas"}"#,
            r#"{"op":"stats"}"#,
            r#"{"op":"clear_cache"}"#,
            r#"{"op":"exit"}"#,
        ];
        for line in lines {
            assert!(serde_json::from_str::<Request>(line).is_ok(), "{}", line);
        }

        match serde_json::from_str::<Request>(lines[0]).unwrap() {
            Request::Load { path, kind, model_id, g2p } => {
                assert_eq!(path, PathBuf::from("/m/lexicon.db"));
                assert_eq!(kind, Some(SourceKind::Tabular));
                assert_eq!(model_id.as_deref(), Some("it_IT-x"));
                assert_eq!(g2p, Some(PathBuf::from("/m/g2p.fst")));
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_malformed_requests_get_an_error() {
        let engine = ValidatorEngine::default();
        for line in ["{not json", r#"{"op":"fly"}"#, r#"{"op":"word"}"#] {
            let response = send(&engine, line);
            assert!(!response.ok);
            assert!(response.error.unwrap().starts_with("malformed request"));
        }
    }

    #[test]
    fn test_exit_ends_the_session() {
        let engine = ValidatorEngine::default();
        let (response, exit) = respond(&engine, r#"{"op":"exit"}"#);
        assert!(response.ok);
        assert!(exit);
    }

    #[test]
    fn test_load_missing_vs_corrupt_source() {
        let dir = TempDir::new().unwrap();
        let engine = ValidatorEngine::default();

        let response = send(&engine, &load_line(&dir.path().join("absent.txt")));
        assert!(!response.ok);
        assert!(!response.error.unwrap().starts_with("model unusable"));

        let bad_table = dir.path().join("bad.tsv");
        fs::write(&bad_table, "wort\tlaute\ncasa\tK\n").unwrap();
        let response = send(&engine, &load_line(&bad_table));
        assert!(response.error.unwrap().starts_with("model unusable"));

        let not_a_database = dir.path().join("lexicon.db");
        fs::write(&not_a_database, LEXICON.repeat(50)).unwrap();
        let response = send(&engine, &load_line(&not_a_database));
        assert!(response.error.unwrap().starts_with("model unusable"));
        assert!(!engine.is_active());
    }

    #[test]
    fn test_word_and_stats_before_and_after_load() {
        let dir = TempDir::new().unwrap();
        let engine = ValidatorEngine::default();

        let response = send(&engine, r#"{"op":"word","word":"casa"}"#);
        assert!(response.ok);
        assert_eq!(response.result.unwrap()["status"], "error");
        let response = send(&engine, r#"{"op":"stats"}"#);
        assert_eq!(response.error.as_deref(), Some("no model is active"));

        let path = dir.path().join("it_IT.txt");
        fs::write(&path, LEXICON).unwrap();
        let response = send(&engine, &load_line(&path));
        assert!(response.ok);
        assert_eq!(response.result.unwrap()["model_id"], "it_IT");

        let response = send(&engine, r#"{"op":"word","word":"Casa"}"#);
        let result = response.result.unwrap();
        assert_eq!(result["status"], "known");
        assert_eq!(result["in_lexicon"], true);

        let response = send(&engine, r#"{"op":"stats"}"#);
        assert!(response.ok);
        assert_eq!(response.result.unwrap()["lexicon"]["total_words"], 4);

        assert!(send(&engine, r#"{"op":"clear_cache"}"#).ok);
        let stats = send(&engine, r#"{"op":"stats"}"#).result.unwrap();
        assert_eq!(stats["lookup_cache_entries"], 0);
    }

    #[test]
    fn test_similar_honours_max_results() {
        let dir = TempDir::new().unwrap();
        let engine = ValidatorEngine::default();
        let path = dir.path().join("it_IT.txt");
        fs::write(&path, LEXICON).unwrap();
        assert!(send(&engine, &load_line(&path)).ok);

        let response = send(&engine, r#"{"op":"similar","word":"casi","max_results":1}"#);
        let result = response.result.unwrap();
        let similar = result.as_array().unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0]["word"], "casa");

        let response = send(&engine, r#"{"op":"similar","word":"casi"}"#);
        assert_eq!(response.result.unwrap().as_array().unwrap().len(), 2);
    }
}
