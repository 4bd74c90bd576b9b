use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use deaditude_lib::analysis::verdict::{CommentaryCatalog, RandomChooser};
use deaditude_lib::commands::batch::{score_batch, DEFAULT_CONCURRENCY};
use deaditude_lib::commands::{db, settings};
use deaditude_lib::{EngineConfig, ScoringEngine, Snapshot, TechMetrics};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "deaditude")]
#[command(about = "Score how obsolete tracked technologies look", long_about = None)]
struct Cli {
    /// Settings file with weight and threshold overrides
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score collected metrics for one or more technologies
    Score {
        /// JSON file holding one tech record or an array of them
        input: PathBuf,
        /// Append the snapshots to this SQLite history file
        #[arg(long)]
        history: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
        /// Print full snapshots as JSON instead of one line per tech
        #[arg(long)]
        json: bool,
        /// Seed commentary selection for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show stored snapshots for a technology
    History {
        tech_id: String,
        #[arg(long)]
        history: PathBuf,
        /// Only show the most recent snapshot
        #[arg(long)]
        latest: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration, or write the defaults to a file
    Config {
        #[arg(long)]
        init: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => settings::load_engine_config(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Score {
            input,
            history,
            concurrency,
            json,
            seed,
        } => {
            let engine = Arc::new(ScoringEngine::new(Arc::new(config))?);
            let techs = read_techs(&input)?;
            log::info!("Scoring {} technologies", techs.len());

            let outcomes = score_batch(engine, techs, concurrency).await;
            let snapshots: Vec<Snapshot> = outcomes
                .iter()
                .filter_map(|outcome| outcome.snapshot().cloned())
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
            } else {
                let catalog = CommentaryCatalog::default();
                let mut chooser = match seed {
                    Some(seed) => RandomChooser::seeded(seed),
                    None => RandomChooser::new(),
                };
                for outcome in &outcomes {
                    match &outcome.result {
                        Ok(snapshot) => {
                            let line = snapshot
                                .commentary_bucket
                                .and_then(|bucket| catalog.pick(bucket, &mut chooser));
                            println!("{}", summary_line(snapshot, line));
                        }
                        Err(reason) => println!("{}: failed ({reason})", outcome.tech_id),
                    }
                }
            }

            if let Some(path) = history {
                let conn = db::open_history(&path)
                    .with_context(|| format!("Failed to open history at {}", path.display()))?;
                let run_id = uuid::Uuid::new_v4().to_string();
                let written = db::insert_snapshots(&conn, &run_id, &snapshots)?;
                log::info!("Appended {written} snapshots to {} (run {run_id})", path.display());
            }

            let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
            if failed > 0 {
                bail!("{failed} of {} technologies failed to score", outcomes.len());
            }
        }
        Commands::History {
            tech_id,
            history,
            latest,
            json,
        } => {
            let conn = db::open_history(&history)
                .with_context(|| format!("Failed to open history at {}", history.display()))?;
            let rows = if latest {
                db::load_latest(&conn, &tech_id)?.into_iter().collect()
            } else {
                db::load_history(&conn, &tech_id)?
            };
            if json {
                let snapshots: Vec<&Snapshot> = rows.iter().map(|row| &row.snapshot).collect();
                println!("{}", serde_json::to_string_pretty(&snapshots)?);
            } else if rows.is_empty() {
                println!("No history for {tech_id}");
            } else {
                for row in &rows {
                    println!("{}", summary_line(&row.snapshot, None));
                }
            }
        }
        Commands::Config { init } => match init {
            Some(path) => {
                settings::save_engine_config(&path, &config)?;
                println!("Wrote settings to {}", path.display());
            }
            None => println!("{}", serde_json::to_string_pretty(&config)?),
        },
    }

    Ok(())
}

fn read_techs(path: &Path) -> anyhow::Result<Vec<TechMetrics>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let techs = match value {
        Value::Array(_) => serde_json::from_value(value)?,
        Value::Object(_) => vec![serde_json::from_value(value)?],
        _ => bail!("{} must hold a tech record or an array of them", path.display()),
    };
    Ok(techs)
}

/// Scores are shown as a 0-100 percentage.
fn display_percent(score: f64) -> String {
    format!("{:.0}%", score * 10.0)
}

fn summary_line(snapshot: &Snapshot, commentary: Option<&str>) -> String {
    let mut line = match snapshot.deaditude_score {
        Some(score) => format!(
            "{} {}: {} {} (confidence {:.0}%)",
            snapshot.snapshot_date,
            snapshot.tech_id,
            display_percent(score),
            snapshot.verdict.label(),
            snapshot.confidence * 100.0
        ),
        None => format!(
            "{} {}: {}",
            snapshot.snapshot_date,
            snapshot.tech_id,
            snapshot.verdict.label()
        ),
    };
    if let Some(band) = snapshot.score_band {
        line.push_str(&format!(
            " [{}-{}]",
            display_percent(band.low),
            display_percent(band.high)
        ));
    }
    if let Some(text) = commentary {
        line.push_str(&format!(" {text}"));
    }
    line
}
