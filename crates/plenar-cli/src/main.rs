//! Plenar CLI - Command-line interface
//!
//! Usage:
//!   plenar segment <transcript>
//!   plenar process <transcripts>... --factions <json> --persons <json>
//!   plenar classify position <text>
//!   plenar classify annotation <text>

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use plenar_core::{AppConfig, LoggingConfig, ReferenceData, SessionId, Transcript};
use plenar_extractor::{
    AnnotationClassifier, FactionRegistry, PositionClassifier, Segmenter, TranscriptSegmenter,
};
use plenar_pipeline::{Pipeline, ResolutionStats};

#[derive(Parser)]
#[command(name = "plenar")]
#[command(about = "Speaker segmentation and resolution for plenary transcripts")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); PLENAR_* variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a transcript into speaker turns
    Segment {
        /// Transcript text file
        path: PathBuf,
    },
    /// Segment, classify and resolve transcripts
    Process {
        /// Transcript files named by session id, e.g. 19042.txt
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Faction reference table (JSON array)
        #[arg(long)]
        factions: PathBuf,

        /// Person reference table (JSON array)
        #[arg(long)]
        persons: PathBuf,

        /// Sitting date (YYYY-MM-DD), applied to every transcript
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print a resolution report to stderr
        #[arg(long)]
        stats: bool,
    },
    /// Classify a single fragment
    Classify {
        #[command(subcommand)]
        target: ClassifyTarget,
    },
}

#[derive(Subcommand)]
enum ClassifyTarget {
    /// Speaker position or faction, e.g. "Bundesminister der Finanzen"
    Position { text: String },
    /// Parenthesized annotation, e.g. "(Beifall bei der SPD)"
    Annotation { text: String },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Session id from a file stem such as `19042`
fn session_from_path(path: &Path) -> anyhow::Result<SessionId> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("no file name in {}", path.display()))?;
    stem.parse()
        .with_context(|| format!("cannot derive session id from {}", path.display()))
}

fn read_transcript(path: &Path, date: Option<NaiveDate>) -> anyhow::Result<Transcript> {
    let session = session_from_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let transcript = Transcript::new(session, text);
    Ok(match date {
        Some(date) => transcript.with_date(date),
        None => transcript,
    })
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Segment { path } => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let turns = TranscriptSegmenter::from_config(&config.segmentation).segment(&text);
            tracing::info!(path = %path.display(), turns = turns.len(), "segmented");
            print_json(&turns)?;
        }
        Commands::Process {
            paths,
            factions,
            persons,
            date,
            stats,
        } => {
            let references = ReferenceData::from_files(&factions, &persons)?;
            tracing::info!(
                factions = references.factions.len(),
                persons = references.persons.len(),
                "loaded reference tables"
            );

            let transcripts = paths
                .iter()
                .map(|path| read_transcript(path, date))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let pipeline = Pipeline::new(&config, Arc::new(references));
            let results = pipeline.process_batch(&transcripts)?;

            if stats {
                eprintln!("{}", ResolutionStats::from_transcripts(&results).report());
            }
            print_json(&results)?;
        }
        Commands::Classify { target } => match target {
            ClassifyTarget::Position { text } => {
                let faction = FactionRegistry::global().resolve(&text);
                let position = PositionClassifier::global().classify(faction.unwrap_or(&text));
                print_json(&serde_json::json!({
                    "faction": faction,
                    "category": position.category,
                    "qualifier": position.qualifier,
                }))?;
            }
            ClassifyTarget::Annotation { text } => {
                let annotation = AnnotationClassifier::new().classify(&text, 0);
                print_json(&annotation)?;
            }
        },
    }

    Ok(())
}
