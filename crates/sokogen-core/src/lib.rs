//! Core engine for push-block puzzles.
//!
//! A level is a 6x6 grid of cells. The player starts in one corner and must
//! reach the opposite corner, pushing blocks out of the way; a block pushed
//! into a hole removes both. The engine solves levels with a memoizing
//! best-first search and generates new ones by simulated annealing, mutating
//! a level one cell at a time and steering toward a target difficulty.

mod generator;
mod grid;
mod normalize;
mod solver;
mod state;

pub use generator::{
    acceptance_probability, Generator, GeneratorConfig, Level, MutateError, Score,
};
pub use grid::{Cell, Grid, Pos};
pub use normalize::{normalize, normalize_around};
pub use solver::{
    ExhaustionEffort, SolveCache, SolveError, SolveOutcome, Solver, SolverConfig, UNSOLVABLE,
};
pub use state::{Fingerprint, GameState};

/// Board side length. Every level is SIZE x SIZE for the whole run.
pub const SIZE: usize = 6;

/// Fixed player starting corner.
pub const PLAYER_START: Pos = Pos::new(0, 0);

/// Fixed goal corner. Always traversable; blocks may never occupy it.
pub const GOAL: Pos = Pos::new(SIZE as i32 - 1, SIZE as i32 - 1);
