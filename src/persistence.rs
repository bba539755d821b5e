// File: src/persistence.rs
//! Compiled lexicon snapshots.
//!
//! Parsing a large text or tabular source is the slow part of model
//! activation. A snapshot stores the parsed entries in bincode so the next
//! activation only has to rebuild the in-memory indexes.

use crate::core::lexicon::LexiconIndex;
use crate::core::types::{LexiconEntry, LexiconSource};
use crate::error::LexiconError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// The serializable state of one compiled lexicon.
#[derive(Clone, Serialize, Deserialize)]
struct Snapshot {
    /// The source the snapshot was compiled from, kind included.
    source: LexiconSource,
    entries: Vec<LexiconEntry>,
    records: usize,
    skipped: usize,
}

/// Parses `source`, checks it holds at least `min_words` words and writes
/// the result to `dest`. Returns the freshly built index.
pub fn materialize(
    source: &LexiconSource,
    dest: &Path,
    min_words: usize,
) -> Result<LexiconIndex, LexiconError> {
    let index = LexiconIndex::load_verified(source, min_words)?;
    save_snapshot(&index, dest)?;
    info!(
        "Materialized {} words from {} into {}",
        index.len(),
        source.path.display(),
        dest.display()
    );
    Ok(index)
}

/// Writes `index` to `path` atomically: the data goes to a temp file in the
/// same directory, which is then renamed over the destination.
pub fn save_snapshot(index: &LexiconIndex, path: &Path) -> Result<(), LexiconError> {
    let parent_dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent_dir).map_err(|e| LexiconError::io(parent_dir, e))?;

    let snapshot = Snapshot {
        source: index.source().clone(),
        entries: index.entries().to_vec(),
        records: index.records(),
        skipped: index.skipped(),
    };

    let temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| LexiconError::io(path, e))?;
    {
        let mut writer = BufWriter::new(&temp_file);
        bincode::serialize_into(&mut writer, &snapshot).map_err(|source| {
            LexiconError::Snapshot { path: path.to_path_buf(), source }
        })?;
        writer.flush().map_err(|e| LexiconError::io(path, e))?;
    }

    temp_file
        .persist(path)
        .map_err(|e| LexiconError::io(path, e.error))?;
    Ok(())
}

/// Reads a snapshot written by [`save_snapshot`]. A snapshot that no longer
/// decodes, or holds fewer than `min_words` words, is reported as corrupt.
pub fn load_snapshot(path: &Path, min_words: usize) -> Result<LexiconIndex, LexiconError> {
    // Decoding from a slice bounds every length prefix by the file size.
    let bytes = fs::read(path).map_err(|e| LexiconError::io(path, e))?;
    let snapshot: Snapshot = bincode::deserialize(&bytes)
        .map_err(|source| LexiconError::Snapshot { path: path.to_path_buf(), source })?;

    let index = LexiconIndex::from_entries(
        snapshot.source,
        snapshot.entries,
        snapshot.records,
        snapshot.skipped,
    );
    index.verify(min_words).map_err(|_| LexiconError::SourceCorrupt {
        path: path.to_path_buf(),
        reason: format!(
            "snapshot holds {} words, expected at least {}",
            index.len(),
            min_words
        ),
    })?;

    info!("Loaded snapshot {} ({} words)", path.display(), index.len());
    Ok(index)
}
