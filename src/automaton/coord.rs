//! Lattice coordinates, the 3D Moore neighborhood and the cubic grid extent.

use std::fmt;
use std::ops::Add;

use crate::error::{LifeError, LifeResult};

/// Smallest accepted grid size per axis.
pub const MIN_GRID_SIZE: u32 = 5;
/// Largest accepted grid size per axis.
pub const MAX_GRID_SIZE: u32 = 50;

/// Integer lattice coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coord {
    pub const ORIGIN: Coord = Coord::new(0, 0, 0);

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Coord { x, y, z }
    }

    /// The 26 Moore neighbors of this coordinate. Not bounds-checked.
    #[inline]
    pub fn neighbors(self) -> impl Iterator<Item = Coord> {
        NEIGHBOR_OFFSETS.iter().map(move |&offset| self + offset)
    }

    /// This coordinate followed by its 26 neighbors.
    #[inline]
    pub fn neighborhood(self) -> impl Iterator<Item = Coord> {
        std::iter::once(self).chain(self.neighbors())
    }
}

impl Add for Coord {
    type Output = Coord;

    #[inline]
    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl From<(i32, i32, i32)> for Coord {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Coord::new(x, y, z)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

const fn build_offsets() -> [Coord; 26] {
    let mut offsets = [Coord::ORIGIN; 26];
    let mut i = 0;
    let mut dz = -1;
    while dz <= 1 {
        let mut dy = -1;
        while dy <= 1 {
            let mut dx = -1;
            while dx <= 1 {
                // Skip the center cell
                if !(dx == 0 && dy == 0 && dz == 0) {
                    offsets[i] = Coord::new(dx, dy, dz);
                    i += 1;
                }
                dx += 1;
            }
            dy += 1;
        }
        dz += 1;
    }
    offsets
}

/// Moore neighborhood offsets: every vector in {-1, 0, 1}³ except the origin.
pub const NEIGHBOR_OFFSETS: [Coord; 26] = build_offsets();

/// Cubic bounds `[0, size)` on every axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extent {
    size: u32,
}

impl Extent {
    /// Create an extent, rejecting sizes outside `MIN_GRID_SIZE..=MAX_GRID_SIZE`.
    pub fn new(size: u32) -> LifeResult<Self> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
            return Err(LifeError::InvalidConfiguration(format!(
                "grid size {size} outside {MIN_GRID_SIZE}..={MAX_GRID_SIZE}"
            )));
        }
        Ok(Extent { size })
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of lattice cells inside the extent.
    #[inline]
    pub fn volume(&self) -> usize {
        let size = self.size as usize;
        size * size * size
    }

    /// Check if coordinates are within the extent.
    #[inline]
    pub fn contains(&self, coord: Coord) -> bool {
        let size = self.size as i64;
        let inside = |v: i32| v >= 0 && (v as i64) < size;
        inside(coord.x) && inside(coord.y) && inside(coord.z)
    }

    /// Like `contains`, but reports the rejection as an error.
    #[inline]
    pub fn check(&self, coord: Coord) -> LifeResult<()> {
        if self.contains(coord) {
            Ok(())
        } else {
            Err(LifeError::OutOfBounds {
                coord,
                size: self.size,
            })
        }
    }

    /// Linear index in z,y,x order. Caller guarantees `contains(coord)`.
    #[inline]
    pub fn index_of(&self, coord: Coord) -> usize {
        let size = self.size as usize;
        coord.z as usize * size * size + coord.y as usize * size + coord.x as usize
    }

    /// Every coordinate inside the extent, z slowest and x fastest.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let size = self.size as i32;
        (0..size).flat_map(move |z| {
            (0..size).flat_map(move |y| (0..size).map(move |x| Coord::new(x, y, z)))
        })
    }
}
