use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use x4sim::{
    observe,
    replay::{self, Trace},
    score, GameConfig,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "x4sim trace runner")]
struct Cli {
    /// Path to the game config YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Action trace to replay (YAML, or JSON with a .json extension)
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Override the config seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the turn limit
    #[arg(long)]
    turns: Option<u32>,

    /// Keep ending turns after the trace until the game is over
    #[arg(long)]
    finish: bool,

    /// Print the simplified observation
    #[arg(long)]
    simple: bool,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Write the observation here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(turns) = cli.turns {
        config.turns.max_turns = turns;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let trace = match &cli.trace {
        Some(path) => Trace::load(path)?,
        None => Trace::default(),
    };
    let mut replay = replay::run(config, &trace).context("Failed to start game")?;
    if cli.finish {
        replay::finish(&mut replay.state);
    }

    let observation = observe(&replay.state, cli.simple);
    let rendered = match cli.format {
        Format::Json => observation.to_json()?,
        Format::Yaml => observation.to_yaml()?,
    };
    match &cli.output {
        Some(path) => fs::write(path, &rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{rendered}"),
    }

    let breakdown = score(&replay.state);
    eprintln!(
        "Game '{}' at turn {} ({:?}); {} of {} steps rejected. Score {:.4} (efficiency {:.3}, population {:.3}, goal {:.3}, diversity {:.3})",
        replay.state.config().name,
        replay.state.turn(),
        replay.state.status(),
        replay.rejected(),
        trace.len(),
        breakdown.total,
        breakdown.resource_efficiency,
        breakdown.population_health,
        breakdown.goal_progress,
        breakdown.strategy_diversity,
    );
    Ok(())
}
