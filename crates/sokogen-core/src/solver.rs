//! Informed search over configuration states, with a memo cache that
//! outlives individual solves.
//!
//! The solver is the difficulty oracle for the annealing driver: it reports
//! the shortest action count for a level together with the search effort
//! spent finding it. The same engine doubles as a coarse reachability check
//! on a sanitized board with every movable obstacle stripped.

use crate::grid::{Cell, Grid};
use crate::state::{Fingerprint, GameState};
use crate::{GOAL, SIZE};
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use thiserror::Error;

/// Sentinel distance for a level (or cached state) proven unsolvable.
pub const UNSOLVABLE: i32 = -1;

/// Maximum parent-chain hops while unwinding a discovered path. The chain
/// can never legitimately grow this long on a bounded board.
const BACKTRACK_LIMIT: u32 = 100;

/// What a search records as cache effort after exhausting its frontier.
///
/// Giveup chains always stamp the actual expansion count; the exhaustion
/// sweep is configurable so either policy can be pinned by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExhaustionEffort {
    /// Record zero effort.
    #[default]
    Zero,
    /// Record the expansions actually performed.
    Actual,
}

/// Tunables for a [`Solver`].
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Expansion ceiling beyond which a level is treated as unsolvable.
    pub giveup_limit: u64,
    /// Effort-recording policy for frontier exhaustion.
    pub exhaustion_effort: ExhaustionEffort,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            giveup_limit: 750_000,
            exhaustion_effort: ExhaustionEffort::Zero,
        }
    }
}

/// Result of one solve: shortest action count (or [`UNSOLVABLE`]) and the
/// number of frontier expansions performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub distance: i32,
    pub effort: u64,
}

impl SolveOutcome {
    /// Whether the level was solved at all.
    pub fn is_solvable(&self) -> bool {
        self.distance != UNSOLVABLE
    }
}

/// Internal invariant violations surfaced by a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SolveError {
    /// The parent chain exceeded its hop ceiling while unwinding a path,
    /// indicating a corrupted parent map. Aborts the solve, not the run.
    #[error("backtrack chain exceeded {limit} hops")]
    BacktrackOverflow { limit: u32 },
}

/// Memo cache mapping state fingerprints to previously determined outcomes.
///
/// Written only by path backtracking and by bulk unsolvable sweeps; never
/// invalidated. Fingerprints are injective over states, so an entry can
/// never be returned for a state with different contents.
#[derive(Debug, Default)]
pub struct SolveCache {
    entries: HashMap<Fingerprint, SolveOutcome>,
}

impl SolveCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached outcome for `fingerprint`, if any.
    pub fn get(&self, fingerprint: Fingerprint) -> Option<SolveOutcome> {
        self.entries.get(&fingerprint).copied()
    }

    /// Record an outcome for `fingerprint`, replacing any previous entry.
    pub fn put(&mut self, fingerprint: Fingerprint, outcome: SolveOutcome) {
        let _ = self.entries.insert(fingerprint, outcome);
    }

    /// Whether `fingerprint` has an entry.
    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.entries.contains_key(&fingerprint)
    }

    /// Number of cached fingerprints.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Frontier entry. Ordering is total over (priority, steps, fingerprint);
/// the state payload never participates in comparisons.
struct OpenEntry {
    priority: u32,
    steps: u32,
    fingerprint: Fingerprint,
    state: GameState,
}

impl OpenEntry {
    fn key(&self) -> (u32, u32, Fingerprint) {
        (self.priority, self.steps, self.fingerprint)
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Best-first solver with a solve-spanning memo cache.
pub struct Solver {
    config: SolverConfig,
    cache: SolveCache,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    /// Create a solver with default configuration and an empty cache.
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    /// Create a solver with custom configuration.
    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            config,
            cache: SolveCache::new(),
        }
    }

    /// The memo cache.
    pub fn cache(&self) -> &SolveCache {
        &self.cache
    }

    /// Mutable access to the memo cache.
    pub fn cache_mut(&mut self) -> &mut SolveCache {
        &mut self.cache
    }

    /// Solve `grid` from the fixed starting corner.
    ///
    /// Expansion stops at the first popped state that wins, is already
    /// cached, or trips the giveup ceiling; the discovered path is then
    /// unwound into the cache. An emptied frontier proves the level
    /// unsolvable and sweeps every visited fingerprint into the cache.
    pub fn solve(&mut self, grid: &Grid) -> Result<SolveOutcome, SolveError> {
        let start = GameState::new(*grid);
        let start_fingerprint = start.fingerprint();

        let mut open = BinaryHeap::new();
        let mut seen = HashSet::new();
        let mut parents: HashMap<Fingerprint, Fingerprint> = HashMap::new();
        let _ = seen.insert(start_fingerprint);
        open.push(Reverse(OpenEntry {
            priority: 0,
            steps: 0,
            fingerprint: start_fingerprint,
            state: start,
        }));

        let mut expansions: u64 = 0;
        while let Some(Reverse(entry)) = open.pop() {
            expansions += 1;

            let gave_up = expansions > self.config.giveup_limit;
            if entry.state.is_won() || self.cache.contains(entry.fingerprint) || gave_up {
                let mut distance = entry.steps as i32;
                let mut effort = expansions;
                if gave_up {
                    distance = UNSOLVABLE;
                }
                if let Some(hit) = self.cache.get(entry.fingerprint) {
                    distance = hit.distance;
                    effort = hit.effort;
                }
                self.unwind(entry.fingerprint, distance, effort, &parents)?;
                return Ok(SolveOutcome { distance, effort });
            }

            for successor in entry.state.successors() {
                let fingerprint = successor.fingerprint();
                if !seen.insert(fingerprint) {
                    continue;
                }
                let _ = parents.insert(fingerprint, entry.fingerprint);

                let steps = entry.steps + 1;
                let priority = (steps + successor.player().manhattan_distance(GOAL))
                    * (SIZE * SIZE) as u32
                    + successor.grid().immovable_count();
                open.push(Reverse(OpenEntry {
                    priority,
                    steps,
                    fingerprint,
                    state: successor,
                }));
            }
        }

        let recorded = match self.config.exhaustion_effort {
            ExhaustionEffort::Zero => 0,
            ExhaustionEffort::Actual => expansions,
        };
        for fingerprint in seen {
            self.cache.put(
                fingerprint,
                SolveOutcome {
                    distance: UNSOLVABLE,
                    effort: recorded,
                },
            );
        }
        Ok(SolveOutcome {
            distance: UNSOLVABLE,
            effort: expansions,
        })
    }

    /// Coarse reachability: can the player walk to the goal at all, with
    /// every movable obstacle stripped? Shares the memo cache with real
    /// solves; sanitized boards are ordinary states to the search.
    pub fn goal_reachable(&mut self, grid: &Grid) -> bool {
        let mut sanitized = Grid::default();
        for (pos, cell) in grid.iter() {
            if cell == Cell::Wall {
                sanitized.set(pos, Cell::Wall);
            }
        }
        self.solve(&sanitized)
            .map_or(false, |outcome| outcome.is_solvable())
    }

    /// Write the discovered chain into the cache, walking parent pointers
    /// from the stopping state back toward the root. The value decrements
    /// by one per hop while the result is solvable and stays [`UNSOLVABLE`]
    /// throughout otherwise; the root itself has no parent and is never
    /// written.
    fn unwind(
        &mut self,
        stop: Fingerprint,
        distance: i32,
        effort: u64,
        parents: &HashMap<Fingerprint, Fingerprint>,
    ) -> Result<(), SolveError> {
        let mut current = stop;
        let mut hops: u32 = 0;
        while let Some(&parent) = parents.get(&current) {
            let value = if distance == UNSOLVABLE {
                UNSOLVABLE
            } else {
                distance - hops as i32
            };
            self.cache.put(current, SolveOutcome { distance: value, effort });
            if distance != UNSOLVABLE {
                hops += 1;
                if hops >= BACKTRACK_LIMIT {
                    return Err(SolveError::BacktrackOverflow {
                        limit: BACKTRACK_LIMIT,
                    });
                }
            }
            current = parent;
        }
        Ok(())
    }
}
