//! Basic example of using the level generator

use sokogen_core::{GameState, Generator, GeneratorConfig, Solver};

fn main() {
    // Generate a level on the short schedule
    println!("Generating a level...\n");
    let mut generator = Generator::with_config_and_seed(GeneratorConfig::quick(), 42);
    let level = generator.generate();

    println!("Generated level:");
    println!("{}", GameState::new(level.grid));

    // Show some stats
    println!("Solution length: {}", level.score.length);
    println!("Effort term: {}", level.score.effort_term);
    println!("Cached configurations: {}", generator.cache_len());

    // Re-solve it from scratch
    println!("\nRe-solving from a cold cache...\n");
    let mut solver = Solver::new();
    match solver.solve(&level.grid) {
        Ok(outcome) if outcome.is_solvable() => {
            println!(
                "Solved in {} moves after {} expansions",
                outcome.distance, outcome.effort
            );
        }
        Ok(_) => println!("Unsolvable (this shouldn't happen for a generated level!)"),
        Err(error) => println!("Solve failed: {error}"),
    }
}
