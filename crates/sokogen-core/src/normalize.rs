//! Canonicalization of dead block layouts.
//!
//! A block that can never be pushed again is functionally a wall. Rewriting
//! such blocks to walls maps equivalent stuck layouts onto one canonical
//! board, which keeps the search space and the memo cache small. Two rules:
//!
//! * any 2x2 window whose four cells are each block, wall, or the goal
//!   position has its blocks frozen to walls;
//! * a single block with a wall (or the board edge) on at least one side of
//!   both axes is frozen to a wall.
//!
//! Both passes are pure grid rewrites and idempotent.

use crate::grid::{Cell, Grid, Pos};
use crate::{GOAL, SIZE};

/// Canonicalize the whole board: every 2x2 window, including the windows
/// straddling the boundary.
pub fn normalize(grid: &mut Grid) {
    for row in -1..SIZE as i32 {
        for col in -1..SIZE as i32 {
            freeze_window(grid, Pos::new(row, col));
        }
    }
}

/// Canonicalize locally after a single-cell change at `pos`: the four 2x2
/// windows containing the cell, then the single-block rule at the cell.
pub fn normalize_around(grid: &mut Grid, pos: Pos) {
    for offset in [Pos::new(0, 0), Pos::new(-1, 0), Pos::new(0, -1), Pos::new(-1, -1)] {
        freeze_window(grid, pos + offset);
    }

    if grid.get(pos) == Cell::Block {
        let vertical = grid.get(pos + Pos::new(1, 0)) == Cell::Wall
            || grid.get(pos + Pos::new(-1, 0)) == Cell::Wall;
        let horizontal = grid.get(pos + Pos::new(0, 1)) == Cell::Wall
            || grid.get(pos + Pos::new(0, -1)) == Cell::Wall;
        if vertical && horizontal {
            grid.set(pos, Cell::Wall);
        }
    }
}

/// Apply the 2x2 rule to the window whose top-left corner is `origin`.
///
/// The goal position counts as immovable terrain here even though its cell
/// stays empty: a block wedged against the goal corner can never leave.
fn freeze_window(grid: &mut Grid, origin: Pos) {
    let window = [
        origin,
        origin + Pos::new(1, 0),
        origin + Pos::new(0, 1),
        origin + Pos::new(1, 1),
    ];

    let all_fixed = window
        .iter()
        .all(|&p| p == GOAL || grid.get(p).is_immovable());
    if !all_fixed {
        return;
    }
    if !window.iter().any(|&p| grid.get(p) == Cell::Block) {
        return;
    }

    for &p in &window {
        if p.in_bounds() && grid.get(p) == Cell::Block {
            grid.set(p, Cell::Wall);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_square_freezes_to_wall() {
        let mut grid = Grid::default();
        for pos in [Pos::new(2, 2), Pos::new(2, 3), Pos::new(3, 2), Pos::new(3, 3)] {
            grid.set(pos, Cell::Block);
        }
        normalize(&mut grid);
        for pos in [Pos::new(2, 2), Pos::new(2, 3), Pos::new(3, 2), Pos::new(3, 3)] {
            assert_eq!(grid.get(pos), Cell::Wall);
        }
    }

    #[test]
    fn test_goal_corner_counts_as_immovable() {
        let mut grid = Grid::default();
        grid.set(Pos::new(4, 4), Cell::Block);
        grid.set(Pos::new(4, 5), Cell::Block);
        grid.set(Pos::new(5, 4), Cell::Wall);
        normalize(&mut grid);
        assert_eq!(grid.get(Pos::new(4, 4)), Cell::Wall);
        assert_eq!(grid.get(Pos::new(4, 5)), Cell::Wall);
    }

    #[test]
    fn test_open_pair_is_left_alone() {
        let mut grid = Grid::default();
        grid.set(Pos::new(2, 2), Cell::Block);
        grid.set(Pos::new(2, 3), Cell::Block);
        normalize(&mut grid);
        assert_eq!(grid.get(Pos::new(2, 2)), Cell::Block);
        assert_eq!(grid.get(Pos::new(2, 3)), Cell::Block);
    }

    #[test]
    fn test_single_block_pinned_in_corner_freezes() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 0), Cell::Block);
        normalize_around(&mut grid, Pos::new(0, 0));
        assert_eq!(grid.get(Pos::new(0, 0)), Cell::Wall);
    }

    #[test]
    fn test_single_block_pinned_on_one_axis_survives() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 3), Cell::Block);
        normalize_around(&mut grid, Pos::new(0, 3));
        assert_eq!(grid.get(Pos::new(0, 3)), Cell::Block);
    }

    #[test]
    fn test_holes_do_not_pin_blocks() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 3), Cell::Block);
        grid.set(Pos::new(0, 2), Cell::Hole);
        grid.set(Pos::new(0, 4), Cell::Hole);
        normalize_around(&mut grid, Pos::new(0, 3));
        assert_eq!(grid.get(Pos::new(0, 3)), Cell::Block);
    }

    #[test]
    fn test_normalize_is_idempotent_on_random_grids() {
        let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            seed
        };

        for _ in 0..200 {
            let mut grid = Grid::default();
            for row in 0..SIZE as i32 {
                for col in 0..SIZE as i32 {
                    grid.set(Pos::new(row, col), Cell::ALL[(next() % 4) as usize]);
                }
            }
            let mut once = grid;
            normalize(&mut once);
            let mut twice = once;
            normalize(&mut twice);
            assert_eq!(once, twice);

            let target = Pos::new((next() % SIZE as u64) as i32, (next() % SIZE as u64) as i32);
            let mut local_once = grid;
            normalize_around(&mut local_once, target);
            let mut local_twice = local_once;
            normalize_around(&mut local_twice, target);
            assert_eq!(local_once, local_twice);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut grid = Grid::default();
        grid.set(Pos::new(0, 1), Cell::Block);
        grid.set(Pos::new(1, 0), Cell::Block);
        grid.set(Pos::new(1, 1), Cell::Block);
        grid.set(Pos::new(3, 3), Cell::Hole);
        grid.set(Pos::new(4, 4), Cell::Block);
        grid.set(Pos::new(4, 5), Cell::Block);
        grid.set(Pos::new(5, 4), Cell::Wall);
        grid.set(Pos::new(2, 5), Cell::Wall);

        let mut once = grid;
        normalize(&mut once);
        let mut twice = once;
        normalize(&mut twice);
        assert_eq!(once, twice);
    }
}
