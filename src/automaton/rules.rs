//! Survival / birth rule for the 26-neighbor topology.

use serde::{Deserialize, Serialize};

use crate::error::{LifeError, LifeResult};

/// Number of neighbors in the 3D Moore neighborhood.
pub const MAX_NEIGHBORS: u8 = 26;

/// Inclusive range of live-neighbor counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRange {
    pub min: u8,
    pub max: u8,
}

impl NeighborRange {
    pub const fn new(min: u8, max: u8) -> Self {
        NeighborRange { min, max }
    }

    #[inline]
    pub fn contains(&self, count: u8) -> bool {
        self.min <= count && count <= self.max
    }

    fn validate(&self, name: &str) -> LifeResult<()> {
        if self.min > self.max || self.max > MAX_NEIGHBORS {
            return Err(LifeError::InvalidConfiguration(format!(
                "{name} range {}..={} must satisfy min <= max <= {MAX_NEIGHBORS}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Life-like rule: a live cell survives with a neighbor count in `survival`,
/// a dead cell is born with a count in `birth`.
///
/// The default is the 5766 rule (survive on 5-7, birth on 6). A missing
/// band deserializes to its default; each band given must be complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub survival: NeighborRange,
    pub birth: NeighborRange,
}

impl Rule {
    pub const fn new(survival: NeighborRange, birth: NeighborRange) -> Self {
        Rule { survival, birth }
    }

    /// Whether a cell is alive in the next generation.
    #[inline]
    pub fn next_alive(&self, alive: bool, neighbors: u8) -> bool {
        if alive {
            self.survival.contains(neighbors)
        } else {
            self.birth.contains(neighbors)
        }
    }

    pub fn validate(&self) -> LifeResult<()> {
        self.survival.validate("survival")?;
        self.birth.validate("birth")?;
        if self.birth.min == 0 {
            // Birth on zero neighbors would need a scan of empty space.
            return Err(LifeError::InvalidConfiguration(
                "birth range must not include 0 neighbors".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Rule {
    fn default() -> Self {
        Rule::new(NeighborRange::new(5, 7), NeighborRange::new(6, 6))
    }
}
