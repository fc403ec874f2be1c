//! Configuration state: one node of the search graph.

use crate::grid::{Cell, Grid, Pos};
use crate::normalize::normalize_around;
use crate::{GOAL, PLAYER_START, SIZE};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Player actions in fixed order: down, up, right, left.
///
/// The order is load-bearing for deterministic replay; successor sets and
/// therefore parent assignments in the search depend on it.
const DIRECTIONS: [Pos; 4] = [
    Pos::new(1, 0),
    Pos::new(-1, 0),
    Pos::new(0, 1),
    Pos::new(0, -1),
];

/// Injective key identifying a [`GameState`] for visited sets and the memo
/// cache.
///
/// Packs the player index (6 bits) and all 36 cells (2 bits each) into a
/// `u128`, so distinct states never share a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint(u128);

/// A snapshot of the puzzle: grid contents plus player position.
///
/// States are immutable; every move that changes the grid produces a fresh
/// copy, so a state can sit in a search frontier unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    grid: Grid,
    player: Pos,
}

impl GameState {
    /// State with the player at the fixed starting corner.
    pub fn new(grid: Grid) -> Self {
        Self::with_player(grid, PLAYER_START)
    }

    /// State with the player at an arbitrary position.
    pub fn with_player(grid: Grid, player: Pos) -> Self {
        Self { grid, player }
    }

    /// The grid snapshot.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The player position.
    pub fn player(&self) -> Pos {
        self.player
    }

    /// Whether the player stands on the goal.
    pub fn is_won(&self) -> bool {
        self.player == GOAL
    }

    /// Identifying key for visited sets and the memo cache.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut bits = (self.player.row * SIZE as i32 + self.player.col) as u128;
        for (_, cell) in self.grid.iter() {
            bits = (bits << 2) | cell as u128;
        }
        Fingerprint(bits)
    }

    /// All states reachable by one player action.
    pub fn successors(&self) -> Vec<GameState> {
        DIRECTIONS
            .iter()
            .filter_map(|&direction| self.step(direction))
            .collect()
    }

    /// Attempt one action in `direction`.
    fn step(&self, direction: Pos) -> Option<GameState> {
        let target = self.player + direction;
        match self.grid.get(target) {
            Cell::Wall | Cell::Hole => None,
            Cell::Empty => Some(Self::with_player(self.grid, target)),
            Cell::Block => {
                let destination = target + direction;
                // Blocks may never come to rest on the goal.
                if destination == GOAL {
                    return None;
                }
                match self.grid.get(destination) {
                    Cell::Wall | Cell::Block => None,
                    Cell::Empty => {
                        let mut grid = self.grid;
                        grid.set(target, Cell::Empty);
                        grid.set(destination, Cell::Block);
                        normalize_around(&mut grid, destination);
                        Some(Self::with_player(grid, target))
                    }
                    Cell::Hole => {
                        // Block and hole consume each other.
                        let mut grid = self.grid;
                        grid.set(target, Cell::Empty);
                        grid.set(destination, Cell::Empty);
                        Some(Self::with_player(grid, target))
                    }
                }
            }
        }
    }
}

impl Hash for GameState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint().hash(state);
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIZE as i32 {
            for col in 0..SIZE as i32 {
                let pos = Pos::new(row, col);
                let glyph = if pos == self.player {
                    'P'
                } else if pos == GOAL {
                    '*'
                } else {
                    self.grid.get(pos).glyph()
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_corner_start_has_two_moves() {
        let state = GameState::new(Grid::default());
        let successors = state.successors();
        assert_eq!(successors.len(), 2);
        for successor in &successors {
            assert_eq!(successor.grid(), state.grid());
        }
    }

    #[test]
    fn test_free_move_keeps_grid_and_input_state() {
        let mut grid = Grid::default();
        grid.set(Pos::new(3, 3), Cell::Hole);
        let state = GameState::with_player(grid, Pos::new(2, 2));
        let before = state;
        let successors = state.successors();
        assert_eq!(successors.len(), 4);
        assert_eq!(state, before);
    }

    #[test]
    fn test_push_block_into_empty() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 1), Cell::Block);
        let state = GameState::new(grid);

        let pushed = state
            .successors()
            .into_iter()
            .find(|s| s.player() == Pos::new(0, 1))
            .expect("push right must be legal");
        assert_eq!(pushed.grid().get(Pos::new(0, 1)), Cell::Empty);
        assert_eq!(pushed.grid().get(Pos::new(0, 2)), Cell::Block);
        // Input untouched.
        assert_eq!(state.grid().get(Pos::new(0, 1)), Cell::Block);
    }

    #[test]
    fn test_push_into_wall_is_blocked() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 1), Cell::Block);
        grid.set(Pos::new(0, 2), Cell::Wall);
        let state = GameState::new(grid);
        assert!(state
            .successors()
            .iter()
            .all(|s| s.player() != Pos::new(0, 1)));
    }

    #[test]
    fn test_walking_into_hole_is_blocked() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 1), Cell::Hole);
        let state = GameState::new(grid);
        let successors = state.successors();
        assert_eq!(successors.len(), 1);
        assert_eq!(successors[0].player(), Pos::new(1, 0));
    }

    #[test]
    fn test_push_into_hole_consumes_both() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 1), Cell::Block);
        grid.set(Pos::new(0, 2), Cell::Hole);
        let state = GameState::new(grid);

        let pushed = state
            .successors()
            .into_iter()
            .find(|s| s.player() == Pos::new(0, 1))
            .expect("push into hole must be legal");
        assert_eq!(pushed.grid().get(Pos::new(0, 1)), Cell::Empty);
        assert_eq!(pushed.grid().get(Pos::new(0, 2)), Cell::Empty);
    }

    #[test]
    fn test_push_onto_goal_always_rejected() {
        // A block one cell from the goal, approached from behind, for every
        // direction that would land it on the goal.
        for direction in DIRECTIONS {
            let block = GOAL - direction;
            let player = block - direction;
            if !block.in_bounds() || !player.in_bounds() {
                continue;
            }
            let mut grid = Grid::default();
            grid.set(block, Cell::Block);
            let state = GameState::with_player(grid, player);
            for successor in state.successors() {
                assert_eq!(successor.grid().get(GOAL), Cell::Empty);
                assert_ne!(successor.player(), block);
            }
        }
    }

    #[test]
    fn test_push_canonicalizes_around_destination() {
        // Pushing a block into the starting corner pins it on both axes, so
        // it freezes to a wall.
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 1), Cell::Block);
        let state = GameState::with_player(grid, Pos::new(0, 2));

        let pushed = state
            .successors()
            .into_iter()
            .find(|s| s.player() == Pos::new(0, 1))
            .expect("push left must be legal");
        assert_eq!(pushed.grid().get(Pos::new(0, 0)), Cell::Wall);
    }

    #[test]
    fn test_fingerprint_matches_equality() {
        let mut grid = Grid::default();
        grid.set(Pos::new(2, 4), Cell::Block);
        let a = GameState::with_player(grid, Pos::new(1, 1));
        let b = GameState::with_player(grid, Pos::new(1, 1));
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let c = GameState::with_player(grid, Pos::new(1, 2));
        assert_ne!(a.fingerprint(), c.fingerprint());

        let mut other = grid;
        other.set(Pos::new(2, 4), Cell::Hole);
        let d = GameState::with_player(other, Pos::new(1, 1));
        assert_ne!(a.fingerprint(), d.fingerprint());
    }

    #[test]
    fn test_fingerprints_never_collide_across_random_states() {
        // Injective by construction; sweep a pseudo-random population anyway.
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        let mut by_fingerprint: HashMap<Fingerprint, GameState> = HashMap::new();
        for _ in 0..500 {
            let mut grid = Grid::default();
            for (pos, _) in Grid::default().iter().collect::<Vec<_>>() {
                let kind = Cell::ALL[(next() % 4) as usize];
                grid.set(pos, kind);
            }
            let player = Pos::new((next() % SIZE as u64) as i32, (next() % SIZE as u64) as i32);
            let state = GameState::with_player(grid, player);
            if let Some(previous) = by_fingerprint.insert(state.fingerprint(), state) {
                assert_eq!(previous, state);
            }
        }
    }

    #[test]
    fn test_render_marks_player_and_goal() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 1), Cell::Wall);
        grid.set(Pos::new(1, 1), Cell::Block);
        grid.set(Pos::new(2, 2), Cell::Hole);
        let rendered = GameState::new(grid).to_string();
        assert_eq!(rendered, "P#....\n.x....\n..O...\n......\n......\n.....*\n");
    }

    #[test]
    fn test_render_player_covers_goal() {
        let state = GameState::with_player(Grid::default(), GOAL);
        assert!(state.to_string().ends_with(".....P\n"));
        assert!(!state.to_string().contains('*'));
    }
}
