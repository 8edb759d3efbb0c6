//! Voxel Life - sparse 3D Game of Life engine
//!
//! The grid tracks only live cells and the dead cells bordering them, so a
//! generation costs time proportional to the live population rather than the
//! grid volume. Every live cell is represented by a recycled visual instance
//! drawn from a bounded pool, and a controller runs generations on a
//! caller-driven cadence.
//!
//! The library is usable from Rust directly or through the C ABI in [`ffi`].

pub mod automaton;
pub mod config;
pub mod controller;
pub mod error;
pub mod ffi;
pub mod pool;
pub mod state;

#[cfg(test)]
mod tests;

pub use automaton::{Coord, Extent, NeighborRange, Rule, SparseGrid, StepDelta};
pub use config::LifeConfig;
pub use controller::{CellMarker, CellVisual, RunState, Simulation, Stats};
pub use error::{LifeError, LifeResult};
pub use pool::{InstanceId, InstancePool, PoolSizing, PoolStats, Recycle, SharedPool};
pub use state::CellState;
