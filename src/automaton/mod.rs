//! Core automaton logic and grid operations.
//!
//! This module contains the sparse grid, the generation step and region
//! transfer. The controller and the FFI layer call into it.

pub mod coord;
pub mod grid;
pub mod region;
pub mod rules;
pub mod stepping;

pub use coord::{Coord, Extent, MAX_GRID_SIZE, MIN_GRID_SIZE, NEIGHBOR_OFFSETS};
pub use grid::SparseGrid;
pub use region::{extract_region, import_region, Region};
pub use rules::{NeighborRange, Rule};
pub use stepping::{step, step_parallel, StepDelta};
