//! Generation stepping over the sparse candidate set.
//!
//! A step runs in two phases. The count phase reads the grid only and yields
//! the coordinates whose state flips; it may run on a rayon pool. The commit
//! phase is single-writer: it applies births and deaths, then rebuilds the
//! ActiveZone frontier from the new live set.

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use tracing::trace;

use super::coord::Coord;
use super::grid::SparseGrid;

/// Coordinates whose alive-state changed during one step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepDelta {
    pub added: FxHashSet<Coord>,
    pub removed: FxHashSet<Coord>,
}

impl StepDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of changed cells.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

/// Rule evaluation for one candidate. Returns the coordinate and its next
/// state only when the state flips.
#[inline]
fn evaluate(grid: &SparseGrid, coord: Coord) -> Option<(Coord, bool)> {
    let alive = grid.active_cells.contains(&coord);
    let next = grid.rule.next_alive(alive, grid.count_neighbors(coord));
    (alive != next).then_some((coord, next))
}

/// Candidate set: every live cell and every `ActiveZone` cell.
fn candidates(grid: &mut SparseGrid) -> Vec<Coord> {
    grid.refresh_frontier();
    grid.cell_states.keys().copied().collect()
}

/// Step the automaton forward by one generation on the calling thread.
pub fn step(grid: &mut SparseGrid) -> StepDelta {
    let candidates = candidates(grid);
    let snapshot: &SparseGrid = grid;
    let flips: Vec<(Coord, bool)> = candidates
        .iter()
        .filter_map(|&c| evaluate(snapshot, c))
        .collect();
    commit(grid, flips, candidates.len())
}

/// Step the automaton forward by one generation, counting neighbors on `pool`.
///
/// Produces the same result as [`step`].
pub fn step_parallel(grid: &mut SparseGrid, pool: &rayon::ThreadPool) -> StepDelta {
    let candidates = candidates(grid);
    let snapshot: &SparseGrid = grid;
    let flips: Vec<(Coord, bool)> = pool.install(|| {
        candidates
            .par_iter()
            .filter_map(|&c| evaluate(snapshot, c))
            .collect()
    });
    commit(grid, flips, candidates.len())
}

fn commit(grid: &mut SparseGrid, flips: Vec<(Coord, bool)>, candidate_count: usize) -> StepDelta {
    let mut delta = StepDelta::default();
    for (coord, alive) in flips {
        if alive {
            grid.active_cells.insert(coord);
            delta.added.insert(coord);
        } else {
            grid.active_cells.remove(&coord);
            delta.removed.insert(coord);
        }
    }

    grid.rebuild_frontier();
    grid.generation += 1;

    trace!(
        generation = grid.generation,
        candidates = candidate_count,
        births = delta.added.len(),
        deaths = delta.removed.len(),
        "generation stepped"
    );
    delta
}

impl SparseGrid {
    /// Shorthand for [`step`].
    pub fn step(&mut self) -> StepDelta {
        step(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::grid::tests::{assert_invariants, grid};
    use crate::automaton::rules::{NeighborRange, Rule};
    use crate::state::CellState;

    fn cube(origin: Coord) -> Vec<Coord> {
        let mut cells = Vec::new();
        for dz in 0..2 {
            for dy in 0..2 {
                for dx in 0..2 {
                    cells.push(origin + Coord::new(dx, dy, dz));
                }
            }
        }
        cells
    }

    #[test]
    fn test_isolated_cell_dies() {
        let mut g = grid(8);
        let c = Coord::new(4, 4, 4);
        g.set_alive(c).unwrap();

        // Opening refresh marks every neighbor before evaluation
        g.refresh_frontier();
        for n in c.neighbors() {
            assert_eq!(g.state_of(n), CellState::ActiveZone);
        }

        let delta = g.step();

        assert!(!g.is_alive(c));
        assert!(delta.added.is_empty());
        assert_eq!(delta.removed.len(), 1);
        assert!(delta.removed.contains(&c));

        // Nothing alive, so the frontier collapses too
        assert_eq!(g.tracked_cells().count(), 0);
        assert_invariants(&g);
        assert_eq!(g.generation(), 1);
    }

    #[test]
    fn test_cube_is_still_life() {
        // Each cube cell sees 7 neighbors (survive on 5-7); no dead cell sees 6.
        let mut g = grid(10);
        for c in cube(Coord::new(4, 4, 4)) {
            g.set_alive(c).unwrap();
        }

        for _ in 0..5 {
            let delta = g.step();
            assert!(delta.is_empty(), "cube should be a fixed point");
            assert_invariants(&g);
        }
        assert_eq!(g.live_count(), 8);
        assert_eq!(g.generation(), 5);
    }

    #[test]
    fn test_birth_from_six_face_neighbors() {
        let mut g = grid(10);
        let center = Coord::new(5, 5, 5);
        let faces = [
            Coord::new(1, 0, 0),
            Coord::new(-1, 0, 0),
            Coord::new(0, 1, 0),
            Coord::new(0, -1, 0),
            Coord::new(0, 0, 1),
            Coord::new(0, 0, -1),
        ];
        for f in faces {
            g.set_alive(center + f).unwrap();
        }

        let delta = g.step();

        // Center had exactly 6 neighbors; each face cell only 4
        assert_eq!(delta.added.len(), 1);
        assert!(delta.added.contains(&center));
        assert_eq!(delta.removed.len(), 6);
        assert!(g.is_alive(center));
        assert_eq!(g.live_count(), 1);
        assert_invariants(&g);
    }

    #[test]
    fn test_delta_only_reports_changes() {
        let mut g = grid(12);
        for c in cube(Coord::new(1, 1, 1)) {
            g.set_alive(c).unwrap();
        }
        let lonely = Coord::new(9, 9, 9);
        g.set_alive(lonely).unwrap();

        let delta = g.step();

        assert!(delta.added.is_empty());
        assert_eq!(delta.removed.len(), 1);
        assert!(delta.removed.contains(&lonely));
        for c in cube(Coord::new(1, 1, 1)) {
            assert!(!delta.removed.contains(&c));
        }
    }

    #[test]
    fn test_boundary_does_not_wrap() {
        // With birth on 3, a dead cell at x=0 would be born if (size-1) wrapped around.
        let rule = Rule::new(NeighborRange::new(0, 26), NeighborRange::new(3, 3));
        let mut g = grid(6);
        g.set_rule(rule).unwrap();
        for c in [Coord::new(5, 2, 2), Coord::new(5, 3, 2), Coord::new(5, 2, 3)] {
            g.set_alive(c).unwrap();
        }

        g.step();

        assert!(!g.is_alive(Coord::new(0, 2, 2)));
        // The dead cell inside the L is born on the near side
        assert!(g.is_alive(Coord::new(4, 2, 2)));
        assert_invariants(&g);
    }

    #[test]
    fn test_mutation_between_steps_feeds_candidates() {
        // Survive on anything, birth on 1: growth must follow freshly placed cells.
        let rule = Rule::new(NeighborRange::new(0, 26), NeighborRange::new(1, 1));
        let mut g = grid(8);
        g.set_rule(rule).unwrap();

        let c = Coord::new(3, 3, 3);
        g.set_alive(c).unwrap();
        assert_eq!(g.state_of(c + Coord::new(1, 0, 0)), CellState::Dead);

        let delta = g.step();
        assert_eq!(delta.added.len(), 26);
        assert_invariants(&g);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(4)
            .build()
            .unwrap();
        let rule = Rule::new(NeighborRange::new(4, 7), NeighborRange::new(5, 6));

        let mut seq = grid(16);
        let mut par = grid(16);
        seq.set_rule(rule).unwrap();
        par.set_rule(rule).unwrap();

        // Deterministic soup from a simple LCG
        let mut lcg: u32 = 7;
        for c in seq.extent().coords().collect::<Vec<_>>() {
            lcg = lcg.wrapping_mul(1103515245).wrapping_add(12345);
            if (lcg >> 16) % 4 == 0 {
                seq.set_alive(c).unwrap();
                par.set_alive(c).unwrap();
            }
        }

        for _ in 0..6 {
            let a = step(&mut seq);
            let b = step_parallel(&mut par, &pool);
            assert_eq!(a, b);
        }
        let mut left: Vec<Coord> = seq.live_cells().collect();
        let mut right: Vec<Coord> = par.live_cells().collect();
        left.sort_unstable();
        right.sort_unstable();
        assert_eq!(left, right);
        assert_invariants(&par);
    }

    #[test]
    fn test_empty_grid_stays_empty() {
        let mut g = grid(5);
        let delta = g.step();
        assert!(delta.is_empty());
        assert_eq!(g.generation(), 1);
    }
}
