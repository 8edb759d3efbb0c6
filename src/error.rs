//! Error types shared by the grid, the pool and the controller.

use thiserror::Error;

use crate::automaton::coord::Coord;
use crate::pool::InstanceId;

/// Errors raised by the simulation core.
///
/// All variants are local and recoverable. Nothing in the crate panics on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifeError {
    /// Coordinate lies outside the configured cubic extent.
    #[error("coordinate {coord} is outside the {size}x{size}x{size} grid")]
    OutOfBounds { coord: Coord, size: u32 },

    /// Release of an instance that is not currently active in this pool.
    #[error("instance {0} is not active in this pool")]
    NotOwned(InstanceId),

    /// Rejected configuration; the previous one stays in effect.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Every slot up to the hard cap is already active.
    #[error("instance pool exhausted at {capacity} instances")]
    PoolExhausted { capacity: usize },
}

/// Result type for simulation operations.
pub type LifeResult<T> = Result<T, LifeError>;
