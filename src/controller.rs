//! Simulation controller: owns the grid and the instance pool, keeps one pooled
//! instance bound to every live cell, and runs generations on a caller-driven
//! cadence.
//!
//! The controller never owns a timer. The host calls [`Simulation::tick`] from
//! its own frame loop with the elapsed time, or [`Simulation::step`] directly.

use std::time::Duration;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, error, info, warn};

use crate::automaton::coord::Coord;
use crate::automaton::grid::SparseGrid;
use crate::automaton::region::{self, Region};
use crate::automaton::stepping::{step, step_parallel, StepDelta};
use crate::config::{validate_speed, LifeConfig};
use crate::error::LifeResult;
use crate::pool::{InstanceId, InstancePool, PoolStats, Recycle};

/// Visual stand-in for a live cell, placed by the controller when bound.
pub trait CellVisual: Recycle + Default {
    fn place(&mut self, coord: Coord);
}

/// Minimal [`CellVisual`]: remembers where it was placed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellMarker {
    pub position: Option<Coord>,
    /// Times this marker has been placed over its lifetime.
    pub placements: u32,
}

impl Recycle for CellMarker {
    fn recycle(&mut self) {
        self.position = None;
    }
}

impl CellVisual for CellMarker {
    fn place(&mut self, coord: Coord) {
        self.position = Some(coord);
        self.placements += 1;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Not started yet; `tick` does nothing.
    Stopped,
    Running,
    Paused,
}

/// Derived read-only statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stats {
    pub live_cells: usize,
    pub cycle_count: u64,
    pub frontier_cells: usize,
    /// Live cells without an instance because the pool is exhausted.
    pub unrepresented: usize,
    pub pool: PoolStats,
}

/// Grid plus pool plus cadence.
pub struct Simulation<V = CellMarker> {
    config: LifeConfig,
    grid: SparseGrid,
    pool: InstancePool<V>,
    instances: FxHashMap<Coord, InstanceId>,
    unrepresented: FxHashSet<Coord>,
    run_state: RunState,
    /// Fractional steps owed, in units of steps.
    accumulator: f64,
    last_delta: StepDelta,
    /// Rayon pool for the count phase; `None` steps on the calling thread.
    thread_pool: Option<rayon::ThreadPool>,
}

fn build_thread_pool(worker_threads: u8) -> Option<rayon::ThreadPool> {
    if worker_threads <= 1 {
        return None;
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads as usize)
        .build()
        .map_err(|e| warn!(%e, "falling back to single-threaded stepping"))
        .ok()
}

impl<V: CellVisual> Simulation<V> {
    pub fn new(config: LifeConfig) -> LifeResult<Self> {
        config.validate()?;
        let extent = config.extent()?;
        let grid = SparseGrid::new(extent, config.rule);
        let mut pool = InstancePool::new(config.pool, config.grid_size);
        if config.prewarm {
            pool.prewarm(pool.default_size());
        }
        let thread_pool = build_thread_pool(config.worker_threads);

        info!(
            grid_size = config.grid_size,
            pool_default = pool.default_size(),
            "simulation created"
        );
        Ok(Simulation {
            config,
            grid,
            pool,
            instances: FxHashMap::default(),
            unrepresented: FxHashSet::default(),
            run_state: RunState::Stopped,
            accumulator: 0.0,
            last_delta: StepDelta::default(),
            thread_pool,
        })
    }

    pub fn start(&mut self) {
        if self.run_state != RunState::Running {
            self.accumulator = 0.0;
            self.run_state = RunState::Running;
            debug!("simulation started");
        }
    }

    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            self.run_state = RunState::Paused;
            debug!("simulation paused");
        }
    }

    pub fn resume(&mut self) {
        if self.run_state == RunState::Paused {
            self.run_state = RunState::Running;
            debug!("simulation resumed");
        }
    }

    pub fn set_speed(&mut self, steps_per_second: f64) -> LifeResult<()> {
        validate_speed(steps_per_second)?;
        self.config.steps_per_second = steps_per_second;
        Ok(())
    }

    /// Mark a cell alive and bind an instance to it.
    pub fn try_add_cell(&mut self, coord: Coord) -> LifeResult<bool> {
        let changed = self.grid.set_alive(coord)?;
        if changed {
            self.materialize(coord);
        }
        Ok(changed)
    }

    /// Mark a cell dead and release its instance.
    pub fn try_remove_cell(&mut self, coord: Coord) -> LifeResult<bool> {
        let changed = self.grid.set_dead(coord)?;
        if changed {
            self.dematerialize(coord);
            self.retry_unrepresented();
        }
        Ok(changed)
    }

    /// Add request from user interaction. Out-of-bounds requests are logged
    /// and ignored. Returns whether the cell changed.
    pub fn request_add_cell(&mut self, coord: Coord) -> bool {
        self.try_add_cell(coord).unwrap_or_else(|e| {
            warn!(%e, "ignoring add request");
            false
        })
    }

    /// Remove request from user interaction. Out-of-bounds requests are logged
    /// and ignored. Returns whether the cell changed.
    pub fn request_remove_cell(&mut self, coord: Coord) -> bool {
        self.try_remove_cell(coord).unwrap_or_else(|e| {
            warn!(%e, "ignoring remove request");
            false
        })
    }

    /// Run one generation and rebind instances for the changed cells.
    pub fn step(&mut self) -> &StepDelta {
        let delta = match &self.thread_pool {
            Some(pool) => step_parallel(&mut self.grid, pool),
            None => step(&mut self.grid),
        };
        self.apply_delta(&delta);
        self.last_delta = delta;
        &self.last_delta
    }

    /// Advance the cadence by `elapsed` and run the steps that became due.
    ///
    /// Runs nothing unless running. At most `max_steps_per_tick` steps run;
    /// any further backlog is dropped.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<StepDelta> {
        if self.run_state != RunState::Running {
            return Vec::new();
        }

        let owed = self.accumulator + elapsed.as_secs_f64() * self.config.steps_per_second;
        let due = owed.floor();
        // Overflow to infinity keeps no fractional remainder
        self.accumulator = if owed.is_finite() { owed - due } else { 0.0 };

        let steps = due.min(self.config.max_steps_per_tick as f64) as u64;
        if (steps as f64) < due {
            debug!(due, steps, "dropping step backlog");
        }

        let mut deltas = Vec::with_capacity(steps as usize);
        for _ in 0..steps {
            deltas.push(self.step().clone());
        }
        deltas
    }

    /// Clear every cell and return all instances to the pool.
    pub fn reset(&mut self) {
        self.grid.reset();
        self.pool.release_all();
        self.instances.clear();
        self.unrepresented.clear();
        self.last_delta = StepDelta::default();
        self.accumulator = 0.0;
        debug!("simulation reset");
    }

    /// Change the grid size. Cells outside the new extent are dropped and
    /// their instances released; the dropped coordinates are returned.
    pub fn resize(&mut self, grid_size: u32) -> LifeResult<Vec<Coord>> {
        let dropped = self.grid.resize(grid_size)?;
        self.config.grid_size = grid_size;
        self.rebind_instances()?;
        Ok(dropped)
    }

    /// Apply a new configuration. On error the previous one stays in effect.
    pub fn reconfigure(&mut self, config: LifeConfig) -> LifeResult<()> {
        config.validate()?;

        let resized = config.grid_size != self.config.grid_size;
        let resized_pool = config.pool != self.config.pool;
        let rethreaded = config.worker_threads != self.config.worker_threads;

        if resized {
            self.grid.resize(config.grid_size)?;
        }
        self.grid.set_rule(config.rule)?;
        if rethreaded {
            self.thread_pool = build_thread_pool(config.worker_threads);
        }
        self.config = config;

        if resized || resized_pool {
            self.pool.release_all();
            self.pool.set_sizing(self.config.pool, self.config.grid_size)?;
            self.rebind_instances()?;
        }
        debug!(grid_size = self.config.grid_size, "simulation reconfigured");
        Ok(())
    }

    /// Import a region (see [`region::import_region`]) keeping instances bound.
    pub fn import_region(&mut self, in_buf: &[u8], min: Coord, max: Coord) -> u64 {
        let Some(region) = Region::clamped(self.grid.extent(), min, max) else {
            return 0;
        };
        if in_buf.len() < region.volume() {
            return 0;
        }

        for (coord, &value) in region.coords().zip(in_buf) {
            let result = if value == 0 {
                self.try_remove_cell(coord)
            } else {
                self.try_add_cell(coord)
            };
            debug_assert!(result.is_ok(), "clamped region yielded {result:?}");
        }
        region.volume() as u64
    }

    fn apply_delta(&mut self, delta: &StepDelta) {
        for &coord in &delta.removed {
            self.dematerialize(coord);
        }
        let before = self.unrepresented.len();
        for &coord in &delta.added {
            self.materialize(coord);
        }
        let missed = self.unrepresented.len().saturating_sub(before);
        if missed > 0 {
            warn!(
                missed,
                capacity = self.pool.max_size(),
                "instance pool exhausted, cells left unrepresented"
            );
        }
        self.retry_unrepresented();
    }

    fn materialize(&mut self, coord: Coord) {
        match self.pool.acquire() {
            Ok(id) => {
                if let Some(visual) = self.pool.get_mut(id) {
                    visual.place(coord);
                }
                self.instances.insert(coord, id);
            }
            Err(_) => {
                self.unrepresented.insert(coord);
            }
        }
    }

    fn dematerialize(&mut self, coord: Coord) {
        match self.instances.remove(&coord) {
            Some(id) => {
                if let Err(e) = self.pool.release(id) {
                    error!(%e, %coord, "instance map out of sync with pool");
                }
            }
            None => {
                self.unrepresented.remove(&coord);
            }
        }
    }

    fn retry_unrepresented(&mut self) {
        if self.unrepresented.is_empty() {
            return;
        }
        let mut waiting: Vec<Coord> = self.unrepresented.iter().copied().collect();
        waiting.sort_unstable();
        for coord in waiting {
            let Ok(id) = self.pool.acquire() else {
                break;
            };
            if let Some(visual) = self.pool.get_mut(id) {
                visual.place(coord);
            }
            self.unrepresented.remove(&coord);
            self.instances.insert(coord, id);
        }
    }

    /// Drop every binding, resize the pool for the current grid and bind
    /// all live cells again.
    fn rebind_instances(&mut self) -> LifeResult<()> {
        self.pool.release_all();
        self.instances.clear();
        self.unrepresented.clear();
        self.pool.configure(self.config.grid_size)?;

        let mut live: Vec<Coord> = self.grid.live_cells().collect();
        live.sort_unstable();
        for coord in live {
            self.materialize(coord);
        }
        Ok(())
    }
}

impl<V> Simulation<V> {
    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn steps_per_second(&self) -> f64 {
        self.config.steps_per_second
    }

    pub fn config(&self) -> &LifeConfig {
        &self.config
    }

    pub fn is_alive(&self, coord: Coord) -> bool {
        self.grid.is_alive(coord)
    }

    pub fn live_count(&self) -> usize {
        self.grid.live_count()
    }

    pub fn cycle_count(&self) -> u64 {
        self.grid.generation()
    }

    pub fn live_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.grid.live_cells()
    }

    /// Delta of the most recent step.
    pub fn last_delta(&self) -> &StepDelta {
        &self.last_delta
    }

    pub fn grid(&self) -> &SparseGrid {
        &self.grid
    }

    pub fn pool(&self) -> &InstancePool<V> {
        &self.pool
    }

    /// Instance bound to a live cell, if any.
    pub fn instance_id(&self, coord: Coord) -> Option<InstanceId> {
        self.instances.get(&coord).copied()
    }

    pub fn instance(&self, coord: Coord) -> Option<&V> {
        self.instance_id(coord).and_then(|id| self.pool.get(id))
    }

    pub fn extract_region(&self, out_buf: &mut [u8], min: Coord, max: Coord) -> u64 {
        region::extract_region(&self.grid, out_buf, min, max)
    }

    pub fn stats(&self) -> Stats {
        Stats {
            live_cells: self.grid.live_count(),
            cycle_count: self.grid.generation(),
            frontier_cells: self.grid.frontier_len(),
            unrepresented: self.unrepresented.len(),
            pool: self.pool.stats(),
        }
    }
}
