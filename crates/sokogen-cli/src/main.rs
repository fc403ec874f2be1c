//! Batch front end for the level generator: seeds the run, installs the
//! diagnostic log collector, and prints the best level found.

use anyhow::Result;
use clap::Parser;
use sokogen_core::{GameState, Generator, GeneratorConfig};

#[derive(Debug, Parser)]
#[command(name = "sokogen", about = "Generate a push-block puzzle level")]
struct Args {
    /// RNG seed; a random seed is drawn when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Run the short annealing schedule instead of the full one.
    #[arg(long)]
    quick: bool,

    /// Print the level and score as JSON instead of a rendered board.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let args = Args::parse();
    let config = if args.quick {
        GeneratorConfig::quick()
    } else {
        GeneratorConfig::default()
    };
    let mut generator = match args.seed {
        Some(seed) => Generator::with_config_and_seed(config, seed),
        None => Generator::with_config(config),
    };

    let level = generator.generate();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&level)?);
    } else {
        println!("{}", GameState::new(level.grid));
        println!(
            "solution length: {}, effort term: {}",
            level.score.length, level.score.effort_term
        );
        println!("cached configurations: {}", generator.cache_len());
    }

    Ok(())
}
