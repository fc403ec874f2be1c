//! Level generation by simulated annealing.
//!
//! The driver starts from a blank board and repeatedly proposes a one-cell
//! mutation, solves the candidate, and accepts or rejects it with a
//! two-tier rule: a strictly longer solution always wins, and on equal
//! length the search effort closest to a target is preferred. Worsening
//! candidates are accepted with a probability that decays as the
//! temperature drops, and the loop periodically restarts from the best
//! level seen so far.

use crate::grid::{Cell, Grid, Pos};
use crate::normalize::normalize_around;
use crate::solver::{SolveOutcome, Solver, SolverConfig};
use crate::state::GameState;
use crate::{ExhaustionEffort, GOAL, PLAYER_START, SIZE, UNSOLVABLE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for level generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Starting annealing temperature.
    pub max_temperature: f64,
    /// Temperature decrement per iteration; the schedule length is
    /// `max_temperature / temperature_step` iterations.
    pub temperature_step: f64,
    /// Temperature period of the elitist restart to the best level.
    pub reset_period: f64,
    /// Search effort a level should ideally cost; both cheaper and more
    /// expensive levels score worse on the secondary axis.
    pub ideal_effort: u64,
    /// Solver expansion ceiling; beyond it a candidate counts as
    /// unsolvable.
    pub giveup_limit: u64,
    /// Effort-recording policy for exhausted searches.
    pub exhaustion_effort: ExhaustionEffort,
    /// Mutation draws before a proposal attempt is abandoned.
    pub max_mutation_attempts: u32,
    /// Solution length above which a new best level is reported.
    pub display_threshold: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_temperature: 50.0,
            temperature_step: 0.01,
            reset_period: 7.0,
            ideal_effort: 250_000,
            giveup_limit: 750_000,
            exhaustion_effort: ExhaustionEffort::Zero,
            max_mutation_attempts: 10_000,
            display_threshold: 16,
        }
    }
}

impl GeneratorConfig {
    /// Short schedule with small search budgets, for demos and tests.
    pub fn quick() -> Self {
        Self {
            max_temperature: 1.0,
            ideal_effort: 5_000,
            giveup_limit: 20_000,
            ..Self::default()
        }
    }
}

/// Quality of a solved candidate, compared lexicographically: solution
/// length first, then the effort term folded around the ideal target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Score {
    pub length: i64,
    pub effort_term: i64,
}

impl Score {
    /// Baseline score of the blank starting level.
    pub const ZERO: Score = Score {
        length: 0,
        effort_term: 0,
    };

    /// Fold a solve outcome into a comparable score.
    pub fn from_outcome(outcome: SolveOutcome, ideal_effort: u64) -> Self {
        let ideal = ideal_effort as i64;
        Self {
            length: outcome.distance as i64,
            effort_term: ideal - (outcome.effort as i64 - ideal).abs(),
        }
    }
}

/// A generated level together with its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub grid: Grid,
    pub score: Score,
}

/// Failure to propose a mutation within the attempt budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MutateError {
    /// Every draw was rejected as identical or goal-unreachable.
    #[error("no valid mutation found after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Probability of replacing the current level with a candidate.
///
/// A strictly longer solution is always accepted; on equal length, so is a
/// candidate whose effort term improved. Every worsening move is accepted
/// with at most probability one half, decaying exponentially with the
/// deficit over the temperature. Unsolvable candidates carry length
/// [`UNSOLVABLE`] and therefore fall into the decaying branch against any
/// solvable incumbent.
pub fn acceptance_probability(old: Score, new: Score, temperature: f64) -> f64 {
    if new.length > old.length {
        return 1.0;
    }
    if new.length < old.length {
        return ((new.length - old.length) as f64 / temperature).exp() / 2.0;
    }
    if new.effort_term > old.effort_term {
        return 1.0;
    }
    ((new.effort_term - old.effort_term) as f64 / temperature).exp() / 2.0
}

/// Annealing level generator.
pub struct Generator {
    config: GeneratorConfig,
    rng: SimpleRng,
    solver: Solver,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// Create a generator with default configuration and entropy seeding.
    pub fn new() -> Self {
        Self::with_config(GeneratorConfig::default())
    }

    /// Create a generator with custom configuration and entropy seeding.
    pub fn with_config(config: GeneratorConfig) -> Self {
        let rng = SimpleRng::new();
        Self::build(config, rng)
    }

    /// Create a generator with a specific seed for reproducibility.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_config_and_seed(GeneratorConfig::default(), seed)
    }

    /// Create a seeded generator with custom configuration.
    pub fn with_config_and_seed(config: GeneratorConfig, seed: u64) -> Self {
        Self::build(config, SimpleRng::with_seed(seed))
    }

    fn build(config: GeneratorConfig, rng: SimpleRng) -> Self {
        let solver = Solver::with_config(SolverConfig {
            giveup_limit: config.giveup_limit,
            exhaustion_effort: config.exhaustion_effort,
        });
        Self {
            config,
            rng,
            solver,
        }
    }

    /// Number of fingerprints accumulated in the memo cache so far.
    pub fn cache_len(&self) -> usize {
        self.solver.cache().len()
    }

    /// Propose a goal-reachable variant of `grid` differing in one cell.
    ///
    /// Each attempt redraws a random cell (never one of the two fixed
    /// corners) and a random kind on a fresh copy of the input, rejecting
    /// draws that leave the board textually unchanged or wall the goal off,
    /// and re-canonicalizing locally around the edit.
    pub fn mutate(&mut self, grid: &Grid) -> Result<Grid, MutateError> {
        for _ in 0..self.config.max_mutation_attempts {
            let pos = Pos::new(
                self.rng.next_usize(SIZE) as i32,
                self.rng.next_usize(SIZE) as i32,
            );
            if pos == PLAYER_START || pos == GOAL {
                continue;
            }
            let kind = Cell::ALL[self.rng.next_usize(Cell::ALL.len())];

            let mut candidate = *grid;
            candidate.set(pos, kind);
            if candidate == *grid {
                continue;
            }
            normalize_around(&mut candidate, pos);

            if self.solver.goal_reachable(&candidate) {
                return Ok(candidate);
            }
        }
        Err(MutateError::RetriesExhausted {
            attempts: self.config.max_mutation_attempts,
        })
    }

    /// Run the full annealing schedule and return the best level found.
    ///
    /// The schedule always completes its fixed iteration count; failed
    /// proposals and solver faults only cost their iteration. When nothing
    /// ever beat the blank baseline, the current level is returned.
    pub fn generate(&mut self) -> Level {
        let mut grid = Grid::default();
        let mut current = Score::ZERO;
        let mut best: Option<Level> = None;

        let mut temperature = self.config.max_temperature;
        while temperature > 0.0 {
            // Elitist restart: pull the walk back to the best level once
            // per reset period.
            if temperature % self.config.reset_period <= self.config.temperature_step {
                if let Some(level) = &best {
                    grid = level.grid;
                    current = level.score;
                }
            }

            match self.mutate(&grid) {
                Ok(candidate) => {
                    let outcome = match self.solver.solve(&candidate) {
                        Ok(outcome) => outcome,
                        Err(error) => {
                            tracing::warn!(%error, "solve failed, scoring candidate unsolvable");
                            SolveOutcome {
                                distance: UNSOLVABLE,
                                effort: 0,
                            }
                        }
                    };
                    let score = Score::from_outcome(outcome, self.config.ideal_effort);

                    let probability = acceptance_probability(current, score, temperature);
                    if self.rng.next_f64() < probability {
                        grid = candidate;
                        current = score;

                        let best_score = best.map_or(Score::ZERO, |level| level.score);
                        if score > best_score {
                            if score.length > self.config.display_threshold {
                                tracing::info!(
                                    length = score.length,
                                    effort = outcome.effort,
                                    "new best level\n{}",
                                    GameState::new(grid)
                                );
                            }
                            best = Some(Level { grid, score });
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(%error, "skipping iteration without a candidate");
                }
            }

            temperature -= self.config.temperature_step;
        }

        best.unwrap_or(Level {
            grid,
            score: current,
        })
    }
}

/// Simple PCG-style PRNG so generation is reproducible from a seed.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new() -> Self {
        // Use getrandom for portable random seeding.
        let mut seed_bytes = [0u8; 8];
        getrandom::getrandom(&mut seed_bytes).unwrap_or_else(|_| {
            // Fallback: use a static counter if getrandom fails
            static COUNTER: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
            let counter = COUNTER.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            seed_bytes = counter.to_le_bytes();
        });
        Self::with_seed(u64::from_le_bytes(seed_bytes))
    }

    fn with_seed(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let xorshifted = (((self.state >> 18) ^ self.state) >> 27) as u32;
        let rot = (self.state >> 59) as u32;
        (xorshifted.rotate_right(rot)) as u64
    }

    fn next_usize(&mut self, bound: usize) -> usize {
        (self.next_u64() as usize) % bound
    }

    fn next_f64(&mut self) -> f64 {
        self.next_u64() as f64 / (u32::MAX as f64 + 1.0)
    }
}
