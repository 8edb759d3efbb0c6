//! Per-cell discrete state.

/// State of a single lattice cell as tracked by the sparse grid.
///
/// `Dead` is never stored: a coordinate missing from the state map is dead.
/// `ActiveZone` marks a dead cell that touches at least one live cell, so the
/// next step can restrict itself to cells that may change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellState {
    #[default]
    Dead = 0,
    Alive = 1,
    ActiveZone = 2,
}

impl CellState {
    #[inline]
    pub fn is_alive(self) -> bool {
        self == CellState::Alive
    }
}
