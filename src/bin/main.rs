// src/bin/main.rs
//! Command-line front end for the lexicon validator.
//!
//! Runs one command and exits, or drops into an interactive loop when no
//! command is given.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::{StyledContent, Stylize};
use std::io::{stdin, stdout, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use validator_core::core::types::SourceKind;
use validator_core::persistence::materialize;
use validator_core::{
    ConfidenceTier, EntityPrediction, LexiconSource, ModelInfo, ValidatorConfig, ValidatorEngine,
    WordPrediction,
};

#[derive(Parser, Debug)]
#[command(name = "validator", about = "Checks how well words and entity names fit a speech model's lexicon")]
struct Args {
    /// Lexicon source: a text lexicon, a SQLite lexicon (.db/.sqlite), a
    /// tabular export (.tsv/.csv) or a compiled snapshot (.bin).
    #[arg(short, long)]
    lexicon: PathBuf,

    /// Source layout, when the extension does not tell. Choices are text and tabular.
    #[arg(short, long)]
    kind: Option<SourceKind>,

    /// G2P artifact shipped with the model. Enables pronunciation estimates.
    #[arg(long)]
    g2p: Option<PathBuf>,

    /// JSON config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a single word.
    Word { word: String },
    /// Validate a multi-word entity name such as `luce_cucina`.
    Entity { name: String },
    /// Validate many entity names, one per line from a file (or stdin with `-`).
    Report { file: PathBuf },
    /// Print lexicon statistics.
    Stats,
    /// Compile the lexicon into a snapshot for faster activation.
    Materialize {
        dest: PathBuf,
        /// Reject sources with fewer words than this.
        #[arg(long)]
        min_words: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => ValidatorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValidatorConfig::default(),
    };

    let kind = args.kind.unwrap_or_else(|| SourceKind::from_path(&args.lexicon));
    let source = LexiconSource::new(&args.lexicon, kind);

    if let Some(Command::Materialize { dest, min_words }) = &args.command {
        let min_words = min_words.unwrap_or(config.verification.min_word_count);
        let index = materialize(&source, dest, min_words)
            .with_context(|| format!("materializing {}", args.lexicon.display()))?;
        println!("Wrote {} words to {}", index.len(), dest.display());
        return Ok(());
    }

    let engine = ValidatorEngine::new(config);
    let mut model = ModelInfo::for_source(source.clone());
    if let Some(g2p) = &args.g2p {
        model = model.with_g2p(g2p);
    }
    let activated = if is_snapshot(&args.lexicon) {
        engine.activate_snapshot(model, &args.lexicon)
    } else {
        engine.activate(model)
    };
    activated.with_context(|| format!("activating lexicon {}", args.lexicon.display()))?;

    match args.command {
        Some(Command::Word { word }) => {
            let prediction = engine.validate_word(&word);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                print_word(&prediction);
            }
        }
        Some(Command::Entity { name }) => {
            let prediction = engine.validate_entity(&name);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                print_entity(&prediction);
            }
        }
        Some(Command::Report { file }) => {
            let names = read_names(&file)?;
            let report = engine.validate_entities(&names);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for entity in &report.entity_results {
                    print_entity(entity);
                }
                println!(
                    "\n{} entities: {} known, {} partially known, {} unknown (score {:.2})",
                    report.total_entities,
                    report.known_entities,
                    report.partially_known_entities,
                    report.unknown_entities,
                    report.overall_score
                );
                for r in &report.recommendations {
                    println!("  - {}", r);
                }
            }
        }
        Some(Command::Stats) => {
            let stats = engine.statistics().context("no model is active")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Model:           {}", stats.model_id);
                println!("Source:          {} ({})", stats.lexicon.source_path.display(), stats.lexicon.source_kind.as_str());
                println!("Words:           {}", stats.lexicon.total_words);
                println!("Pronunciations:  {}", stats.lexicon.total_pronunciations);
                println!("Avg per word:    {:.2}", stats.lexicon.avg_pronunciations_per_word);
                println!("Skipped lines:   {}", stats.lexicon.skipped_lines);
                println!("G2P:             {}", if stats.g2p_available { "enabled" } else { "disabled" });
                println!("Sample:          {}", stats.lexicon.sample_words.join(", "));
            }
        }
        Some(Command::Materialize { .. }) => unreachable!("handled before activation"),
        None => interactive(&engine)?,
    }

    Ok(())
}

fn is_snapshot(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("bin")
}

fn read_names(file: &Path) -> Result<Vec<String>> {
    let lines: Vec<String> = if file.as_os_str() == "-" {
        stdin().lock().lines().collect::<std::io::Result<_>>()?
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?
            .lines()
            .map(str::to_string)
            .collect()
    };
    let names: Vec<String> = lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if names.is_empty() {
        bail!("no entity names in {}", file.display());
    }
    Ok(names)
}

fn interactive(engine: &ValidatorEngine) -> Result<()> {
    println!("Lexicon validator. Model: {}", engine.model_id().unwrap_or_default());
    println!("---------------------------------------------------------------");
    println!("Type a word, or ':e <name>' for an entity, ':s <word>' for similar");
    println!("words, ':stats', ':clear'. 'exit' to quit.\n");

    loop {
        print!("> ");
        stdout().flush()?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim();

        match cmd {
            "exit" | "quit" => break,
            "" => {}
            ":stats" => {
                if let Some(stats) = engine.statistics() {
                    println!(
                        "{} words, {} pronunciations, {} cached lookups, {} cached G2P results",
                        stats.lexicon.total_words,
                        stats.lexicon.total_pronunciations,
                        stats.lookup_cache_entries,
                        stats.g2p_cache_entries
                    );
                }
            }
            ":clear" => {
                engine.clear_caches();
                println!("Caches cleared");
            }
            s if s.starts_with(":e ") => print_entity(&engine.validate_entity(s[3..].trim())),
            s if s.starts_with(":s ") => {
                let word = s[3..].trim();
                let similar = engine.suggest_alternatives(word, engine.config().similarity.max_results);
                if similar.is_empty() {
                    println!("No similar words found.");
                }
                for (i, s) in similar.iter().enumerate() {
                    println!("  {}: {} ({:.0}%)", i + 1, s.word, s.score * 100.0);
                }
            }
            word => print_word(&engine.validate_word(word)),
        }
    }
    Ok(())
}

fn styled_tier(tier: ConfidenceTier) -> StyledContent<String> {
    let label = tier.as_str().to_uppercase();
    match tier {
        ConfidenceTier::Excellent => label.green().bold(),
        ConfidenceTier::Good => label.green(),
        ConfidenceTier::Moderate => label.yellow(),
        ConfidenceTier::Poor => label.red(),
        ConfidenceTier::Unknown => label.red().bold(),
    }
}

fn print_word(p: &WordPrediction) {
    println!(
        "{} [{}] score {:.2}",
        p.word,
        styled_tier(p.confidence_tier),
        p.confidence_score
    );
    for pron in &p.pronunciations {
        println!("  /{}/", pron.join(" "));
    }
    if let Some(pron) = &p.g2p_pronunciation {
        println!("  estimated /{}/", pron.join(" "));
    }
    for s in &p.similar_words {
        println!("  ~ {} ({:.0}%)", s.word, s.score * 100.0);
    }
    println!("  {}", p.recommendation);
}

fn print_entity(e: &EntityPrediction) {
    println!(
        "{} [{}] score {:.2}, {:.0}% recognizable",
        e.entity_name,
        styled_tier(e.overall_tier),
        e.overall_score,
        e.recognition_percentage
    );
    for w in &e.word_predictions {
        println!(
            "  {:<16} {} {:.2}",
            w.word,
            styled_tier(w.confidence_tier),
            w.confidence_score
        );
    }
    for r in &e.recommendations {
        println!("  - {}", r);
    }
    for alt in &e.suggested_alternatives {
        println!("  => {}", alt);
    }
}
