//! Sparse cell store: the live set plus the ActiveZone frontier around it.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use super::coord::{Coord, Extent};
use super::rules::Rule;
use crate::error::LifeResult;
use crate::state::CellState;

/// Authoritative cell-state store.
///
/// `active_cells` holds exactly the live coordinates. `cell_states` maps every
/// live coordinate to `Alive` and every dead coordinate touching a live one to
/// `ActiveZone`; anything else is implicitly dead.
pub struct SparseGrid {
    pub(crate) extent: Extent,
    pub(crate) rule: Rule,
    pub(crate) active_cells: FxHashSet<Coord>,
    pub(crate) cell_states: FxHashMap<Coord, CellState>,
    /// Coordinates mutated since the last step; their neighborhoods get
    /// reclassified before the next candidate set is taken.
    pub(crate) dirty: FxHashSet<Coord>,
    pub(crate) generation: u64,
}

impl SparseGrid {
    pub fn new(extent: Extent, rule: Rule) -> Self {
        SparseGrid {
            extent,
            rule,
            active_cells: FxHashSet::default(),
            cell_states: FxHashMap::default(),
            dirty: FxHashSet::default(),
            generation: 0,
        }
    }

    #[inline]
    pub fn extent(&self) -> Extent {
        self.extent
    }

    #[inline]
    pub fn rule(&self) -> Rule {
        self.rule
    }

    /// Replace the rule. Takes effect on the next step.
    pub fn set_rule(&mut self, rule: Rule) -> LifeResult<()> {
        rule.validate()?;
        self.rule = rule;
        Ok(())
    }

    /// Completed generations since construction or the last reset.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[inline]
    pub fn live_count(&self) -> usize {
        self.active_cells.len()
    }

    /// Number of cells currently marked `ActiveZone`.
    pub fn frontier_len(&self) -> usize {
        self.cell_states.len() - self.active_cells.len()
    }

    #[inline]
    pub fn is_alive(&self, coord: Coord) -> bool {
        self.active_cells.contains(&coord)
    }

    /// Tracked state of a coordinate; `Dead` when untracked or out of bounds.
    #[inline]
    pub fn state_of(&self, coord: Coord) -> CellState {
        self.cell_states.get(&coord).copied().unwrap_or_default()
    }

    pub fn live_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.active_cells.iter().copied()
    }

    /// Every tracked (`Alive` or `ActiveZone`) coordinate with its state.
    pub fn tracked_cells(&self) -> impl Iterator<Item = (Coord, CellState)> + '_ {
        self.cell_states.iter().map(|(&c, &s)| (c, s))
    }

    /// Mark a cell alive. Returns whether its state changed.
    pub fn set_alive(&mut self, coord: Coord) -> LifeResult<bool> {
        self.extent.check(coord)?;
        if !self.active_cells.insert(coord) {
            return Ok(false);
        }
        self.cell_states.insert(coord, CellState::Alive);
        self.dirty.insert(coord);
        Ok(true)
    }

    /// Mark a cell dead. Returns whether its state changed.
    ///
    /// The cell keeps an `ActiveZone` entry if a neighbor is still alive.
    pub fn set_dead(&mut self, coord: Coord) -> LifeResult<bool> {
        self.extent.check(coord)?;
        if !self.active_cells.remove(&coord) {
            return Ok(false);
        }
        if self.has_live_neighbor(coord) {
            self.cell_states.insert(coord, CellState::ActiveZone);
        } else {
            self.cell_states.remove(&coord);
        }
        self.dirty.insert(coord);
        Ok(true)
    }

    /// Count alive neighbors using Moore neighborhood (26 neighbors).
    ///
    /// Live cells never lie outside the extent, so out-of-extent neighbors
    /// count as dead without wrapping.
    pub fn count_neighbors(&self, coord: Coord) -> u8 {
        coord
            .neighbors()
            .filter(|n| self.active_cells.contains(n))
            .count() as u8
    }

    pub fn has_live_neighbor(&self, coord: Coord) -> bool {
        coord.neighbors().any(|n| self.active_cells.contains(&n))
    }

    /// Apply pending ActiveZone recomputation for cells mutated since the last step.
    pub fn refresh_frontier(&mut self) {
        if self.dirty.is_empty() {
            return;
        }
        let mut dirty = std::mem::take(&mut self.dirty);
        for &coord in &dirty {
            for cell in coord.neighborhood() {
                if self.extent.contains(cell) {
                    self.reclassify(cell);
                }
            }
        }
        dirty.clear();
        self.dirty = dirty;
    }

    fn reclassify(&mut self, coord: Coord) {
        if self.active_cells.contains(&coord) {
            self.cell_states.insert(coord, CellState::Alive);
        } else if self.has_live_neighbor(coord) {
            self.cell_states.insert(coord, CellState::ActiveZone);
        } else {
            self.cell_states.remove(&coord);
        }
    }

    /// Recompute `cell_states` from the live set alone.
    pub(crate) fn rebuild_frontier(&mut self) {
        let extent = self.extent;
        self.cell_states.clear();
        for &coord in &self.active_cells {
            self.cell_states.insert(coord, CellState::Alive);
        }
        for &coord in &self.active_cells {
            for n in coord.neighbors() {
                if extent.contains(n) {
                    self.cell_states.entry(n).or_insert(CellState::ActiveZone);
                }
            }
        }
        self.dirty.clear();
    }

    /// Clear all cells and the generation counter. The extent and rule stay.
    pub fn reset(&mut self) {
        self.active_cells.clear();
        self.cell_states.clear();
        self.dirty.clear();
        self.generation = 0;
        debug!(size = self.extent.size(), "grid reset");
    }

    /// Change the bounding cube. Live cells outside the new extent are dropped
    /// and returned, sorted.
    pub fn resize(&mut self, size: u32) -> LifeResult<Vec<Coord>> {
        let extent = Extent::new(size)?;
        let mut dropped: Vec<Coord> = self
            .active_cells
            .iter()
            .copied()
            .filter(|&c| !extent.contains(c))
            .collect();
        dropped.sort_unstable();

        for coord in &dropped {
            self.active_cells.remove(coord);
        }
        self.extent = extent;
        self.rebuild_frontier();

        debug!(size, dropped = dropped.len(), "grid resized");
        Ok(dropped)
    }
}
