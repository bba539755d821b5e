// File: src/core/parser.rs
//! Parsers for the two lexicon layouts.
//!
//! Text sources hold one pronunciation per line:
//!
//! ```text
//! # comment
//! casa K AA Z AH
//! casa K AA S AH
//! luce	L U CH E
//! ```
//!
//! Tabular sources hold `(word, phonemes, pron_order)` rows, either in the
//! `word_phonemes` table of a SQLite database or in a delimited export with
//! a header row. Malformed lines and rows are skipped and counted.

use crate::core::types::{LexiconEntry, Pronunciation, SourceKind};
use crate::error::LexiconError;
use rusqlite::{Connection, OpenFlags};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Output of one parse: distinct entries in first-seen order.
#[derive(Debug, Default)]
pub struct ParsedLexicon {
    pub entries: Vec<LexiconEntry>,
    pub records: usize,
    pub skipped: usize,
}

/// Groups pronunciation records by word, keeping first-seen word order.
#[derive(Default)]
struct EntryAccumulator {
    positions: HashMap<String, usize>,
    entries: Vec<(String, Vec<(i64, Pronunciation)>)>,
    records: usize,
    skipped: usize,
}

impl EntryAccumulator {
    fn push(&mut self, word: &str, order: i64, pronunciation: Pronunciation) {
        let idx = match self.positions.get(word) {
            Some(&idx) => idx,
            None => {
                self.entries.push((word.to_string(), Vec::new()));
                self.positions.insert(word.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        self.entries[idx].1.push((order, pronunciation));
        self.records += 1;
    }

    fn skip(&mut self) {
        self.skipped += 1;
    }

    fn finish(self) -> ParsedLexicon {
        let entries = self
            .entries
            .into_iter()
            .map(|(word, mut prons)| {
                // Stable: equal orders keep source order.
                prons.sort_by_key(|(order, _)| *order);
                LexiconEntry {
                    word,
                    pronunciations: prons.into_iter().map(|(_, p)| p).collect(),
                }
            })
            .collect();
        ParsedLexicon {
            entries,
            records: self.records,
            skipped: self.skipped,
        }
    }
}

/// Table holding one row per pronunciation.
pub const LEXICON_TABLE: &str = "word_phonemes";

/// Opens and parses `path` according to `kind`.
pub fn parse_source(path: &Path, kind: SourceKind) -> Result<ParsedLexicon, LexiconError> {
    let parsed = match kind {
        SourceKind::Text => {
            let file = File::open(path).map_err(|e| LexiconError::io(path, e))?;
            parse_text(BufReader::new(file), path)?
        }
        SourceKind::Tabular => match export_delimiter(path) {
            Some(delimiter) => {
                let file = File::open(path).map_err(|e| LexiconError::io(path, e))?;
                parse_table(file, delimiter, path)?
            }
            None => parse_sqlite(path)?,
        },
    };
    if parsed.skipped > 0 {
        warn!(
            "Skipped {} malformed lines in {}",
            parsed.skipped,
            path.display()
        );
    }
    Ok(parsed)
}

/// Delimiter of a tabular export: comma for `.csv`, tab for `.tsv`.
/// Any other tabular source is a SQLite database.
pub fn export_delimiter(path: &Path) -> Option<u8> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => Some(b','),
        Some("tsv") => Some(b'\t'),
        _ => None,
    }
}

/// Parses the line-oriented text layout. Lines that are not valid UTF-8
/// are skipped like any other malformed line.
pub fn parse_text<R: BufRead>(mut reader: R, path: &Path) -> Result<ParsedLexicon, LexiconError> {
    let mut acc = EntryAccumulator::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| LexiconError::io(path, e))?;
        if read == 0 {
            break;
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim_end(),
            Err(e) => {
                debug!("Lexicon line is not UTF-8: {}", e);
                acc.skip();
                continue;
            }
        };
        let content = line.trim_start();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        match split_text_line(line) {
            Some((word, phonemes)) => acc.push(word, 0, phonemes),
            None => {
                debug!("Malformed lexicon line: {:?}", line);
                acc.skip();
            }
        }
    }

    Ok(acc.finish())
}

/// `word<TAB>ph ph ...` or `word ph ph ...`. Returns `None` when either
/// the word or the phonemes are missing.
fn split_text_line(line: &str) -> Option<(&str, Pronunciation)> {
    let (word, rest) = match line.split_once('\t') {
        Some((word, rest)) => (word.trim(), rest),
        None => {
            let mut parts = line.trim_start().splitn(2, char::is_whitespace);
            (parts.next()?, parts.next().unwrap_or(""))
        }
    };
    let phonemes = split_phonemes(rest);
    if word.is_empty() || phonemes.is_empty() {
        return None;
    }
    Some((word, phonemes))
}

fn split_phonemes(s: &str) -> Pronunciation {
    s.split_whitespace().map(str::to_string).collect()
}

#[derive(Debug, Deserialize)]
struct TableRow {
    word: String,
    phonemes: String,
    #[serde(default)]
    pron_order: i64,
}

/// Parses a delimited `(word, phonemes, pron_order)` export with a header.
pub fn parse_table<R: Read>(
    reader: R,
    delimiter: u8,
    path: &Path,
) -> Result<ParsedLexicon, LexiconError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|source| LexiconError::Table {
        path: path.to_path_buf(),
        source,
    })?;
    for required in ["word", "phonemes"] {
        if !headers.iter().any(|h| h == required) {
            return Err(LexiconError::SourceCorrupt {
                path: path.to_path_buf(),
                reason: format!("table header lacks '{}' column", required),
            });
        }
    }

    let mut acc = EntryAccumulator::default();
    for row in rdr.deserialize::<TableRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(LexiconError::Table {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
            Err(e) => {
                debug!("Malformed lexicon row: {}", e);
                acc.skip();
                continue;
            }
        };

        let phonemes = split_phonemes(&row.phonemes);
        if row.word.is_empty() || phonemes.is_empty() {
            acc.skip();
            continue;
        }
        acc.push(&row.word, row.pron_order, phonemes);
    }

    Ok(acc.finish())
}

/// Reads every row of the `word_phonemes` table of a SQLite lexicon.
///
/// A missing file or a database without the table is `SourceNotFound`;
/// a file that is not a SQLite database is reported as corrupt.
pub fn parse_sqlite(path: &Path) -> Result<ParsedLexicon, LexiconError> {
    if !path.is_file() {
        return Err(LexiconError::SourceNotFound { path: path.to_path_buf() });
    }
    let db_err = |source: rusqlite::Error| LexiconError::Database {
        path: path.to_path_buf(),
        source,
    };

    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(db_err)?;
    let has_table: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [LEXICON_TABLE],
            |row| row.get(0),
        )
        .map_err(db_err)?;
    if !has_table {
        warn!("{} has no {} table", path.display(), LEXICON_TABLE);
        return Err(LexiconError::SourceNotFound { path: path.to_path_buf() });
    }

    let mut stmt = conn
        .prepare("SELECT word, phonemes, pron_order FROM word_phonemes ORDER BY word, pron_order")
        .map_err(db_err)?;
    let mut rows = stmt.query([]).map_err(db_err)?;

    let mut acc = EntryAccumulator::default();
    while let Some(row) = rows.next().map_err(db_err)? {
        let (word, phonemes, order) = match read_row(row) {
            Ok((Some(word), Some(phonemes), order)) => (word, phonemes, order.unwrap_or(0)),
            Ok(_) => {
                acc.skip();
                continue;
            }
            Err(e) => {
                debug!("Malformed lexicon row: {}", e);
                acc.skip();
                continue;
            }
        };

        let word = word.trim();
        let phonemes = split_phonemes(&phonemes);
        if word.is_empty() || phonemes.is_empty() {
            acc.skip();
            continue;
        }
        acc.push(word, order, phonemes);
    }

    Ok(acc.finish())
}

type SqliteRow = (Option<String>, Option<String>, Option<i64>);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SqliteRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn text(input: &str) -> ParsedLexicon {
        parse_text(input.as_bytes(), Path::new("test.txt")).unwrap()
    }

    fn table(input: &str) -> ParsedLexicon {
        parse_table(input.as_bytes(), b'\t', Path::new("test.tsv")).unwrap()
    }

    #[test]
    fn test_text_skips_comments_and_blank_lines() {
        let parsed = text("# header\n\ncasa K AA Z AH\n   \n# another\nluce L U CH E\n");
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.records, 2);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.entries[0].word, "casa");
        assert_eq!(parsed.entries[0].pronunciations, vec![vec!["K", "AA", "Z", "AH"]]);
    }

    #[test]
    fn test_text_accumulates_repeated_words() {
        let parsed = text("casa K AA Z AH\nluce L U CH E\ncasa K AA S AH\n");
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.records, 3);
        assert_eq!(
            parsed.entries[0].pronunciations,
            vec![vec!["K", "AA", "Z", "AH"], vec!["K", "AA", "S", "AH"]]
        );
    }

    #[test]
    fn test_text_tab_separated_second_field() {
        let parsed = text("luce\tL U CH E\n");
        assert_eq!(parsed.entries[0].word, "luce");
        assert_eq!(parsed.entries[0].pronunciations[0], vec!["L", "U", "CH", "E"]);
    }

    #[test]
    fn test_text_malformed_lines_are_counted() {
        let parsed = text("lonely\n\tK AA\ncasa K AA Z AH\nluce\t   \n");
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn test_table_groups_and_orders_by_pron_order() {
        let parsed = table(
            "word\tphonemes\tpron_order\n\
             casa\tK AA S AH\t2\n\
             luce\tL U CH E\t1\n\
             casa\tK AA Z AH\t1\n",
        );
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.records, 3);
        assert_eq!(
            parsed.entries[0].pronunciations,
            vec![vec!["K", "AA", "Z", "AH"], vec!["K", "AA", "S", "AH"]]
        );
    }

    #[test]
    fn test_table_skips_bad_rows() {
        let parsed = table(
            "word\tphonemes\tpron_order\n\
             casa\tK AA Z AH\t1\n\
             \tK AA\t1\n\
             luce\t\t1\n\
             sole\tS O L E\tnot-a-number\n",
        );
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn test_table_without_required_header_is_corrupt() {
        let err = parse_table("a\tb\nx\ty\n".as_bytes(), b'\t', Path::new("bad.tsv")).unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_table_missing_order_defaults_to_source_order() {
        let parsed = parse_table(
            "word,phonemes\ncasa,K AA Z AH\ncasa,K AA S AH\n".as_bytes(),
            b',',
            Path::new("x.csv"),
        )
        .unwrap();
        assert_eq!(parsed.entries[0].pronunciations[1], vec!["K", "AA", "S", "AH"]);
    }

    #[test]
    fn test_missing_file_is_source_not_found() {
        let err = parse_source(Path::new("/no/such/lexicon.txt"), SourceKind::Text).unwrap_err();
        assert!(matches!(err, LexiconError::SourceNotFound { .. }));
    }

    #[test]
    fn test_delimiter_from_extension() {
        assert_eq!(export_delimiter(Path::new("a.csv")), Some(b','));
        assert_eq!(export_delimiter(Path::new("a.tsv")), Some(b'\t'));
        assert_eq!(export_delimiter(Path::new("lexicon.db")), None);
    }

    #[test]
    fn test_text_skips_invalid_utf8_lines() {
        let input: &[u8] = b"casa K AA Z AH\nbad\xff\xfe word X\nluce L U CH E\n";
        let parsed = parse_text(input, Path::new("test.txt")).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.entries[1].word, "luce");
    }

    #[test]
    fn test_text_handles_crlf_and_missing_final_newline() {
        let parsed = text("casa K AA Z AH\r\nluce L U CH E");
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.entries[0].pronunciations[0], vec!["K", "AA", "Z", "AH"]);
        assert_eq!(parsed.entries[1].pronunciations[0], vec!["L", "U", "CH", "E"]);
    }

    fn sqlite_lexicon(dir: &TempDir, rows: &[(Option<&str>, Option<&str>, i64)]) -> PathBuf {
        let path = dir.path().join("lexicon.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute(
            "CREATE TABLE word_phonemes (word TEXT, phonemes TEXT, pron_order INTEGER)",
            [],
        )
        .unwrap();
        for (word, phonemes, order) in rows {
            conn.execute(
                "INSERT INTO word_phonemes (word, phonemes, pron_order) VALUES (?1, ?2, ?3)",
                rusqlite::params![word, phonemes, order],
            )
            .unwrap();
        }
        path
    }

    #[test]
    fn test_sqlite_groups_and_orders_by_pron_order() {
        let dir = TempDir::new().unwrap();
        let path = sqlite_lexicon(
            &dir,
            &[
                (Some("luce"), Some("L U CH E"), 1),
                (Some("casa"), Some("K AA S AH"), 2),
                (Some("casa"), Some("K AA Z AH"), 1),
            ],
        );
        let parsed = parse_source(&path, SourceKind::Tabular).unwrap();
        assert_eq!(parsed.entries.len(), 2);
        assert_eq!(parsed.records, 3);
        assert_eq!(parsed.entries[0].word, "casa");
        assert_eq!(
            parsed.entries[0].pronunciations,
            vec![vec!["K", "AA", "Z", "AH"], vec!["K", "AA", "S", "AH"]]
        );
    }

    #[test]
    fn test_sqlite_skips_null_and_empty_rows() {
        let dir = TempDir::new().unwrap();
        let path = sqlite_lexicon(
            &dir,
            &[
                (Some("casa"), Some("K AA Z AH"), 1),
                (None, Some("X"), 1),
                (Some("luce"), None, 1),
                (Some("sole"), Some("   "), 1),
            ],
        );
        let parsed = parse_sqlite(&path).unwrap();
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn test_sqlite_without_table_is_source_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexicon.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute("CREATE TABLE other (x TEXT)", []).unwrap();
        drop(conn);

        let err = parse_sqlite(&path).unwrap_err();
        assert!(matches!(err, LexiconError::SourceNotFound { .. }));
    }

    #[test]
    fn test_sqlite_missing_file_is_source_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.db");
        let err = parse_source(&path, SourceKind::Tabular).unwrap_err();
        assert!(matches!(err, LexiconError::SourceNotFound { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_non_sqlite_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lexicon.db");
        std::fs::write(&path, "casa K AA Z AH\n".repeat(200)).unwrap();
        let err = parse_sqlite(&path).unwrap_err();
        assert!(err.is_corrupt());
    }
}
