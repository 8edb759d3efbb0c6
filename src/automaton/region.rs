//! Region extraction and import operations.
//!
//! Regions are axis-aligned boxes `[min, max)` transferred as one byte per
//! cell (0 = dead, 1 = alive) in z,y,x order: z changes slowest, x fastest.

use super::coord::{Coord, Extent};
use super::grid::SparseGrid;

/// An axis-aligned box already clamped to a grid extent. Never empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub min: Coord,
    pub max: Coord,
}

impl Region {
    /// Clamp `[min, max)` to the extent. Returns `None` for an empty or inverted box.
    pub fn clamped(extent: Extent, min: Coord, max: Coord) -> Option<Region> {
        let size = extent.size() as i32;
        let clamp = |v: i32| v.clamp(0, size);
        let min = Coord::new(clamp(min.x), clamp(min.y), clamp(min.z));
        let max = Coord::new(clamp(max.x), clamp(max.y), clamp(max.z));

        if min.x >= max.x || min.y >= max.y || min.z >= max.z {
            return None;
        }
        Some(Region { min, max })
    }

    pub fn volume(&self) -> usize {
        (self.max.x - self.min.x) as usize
            * (self.max.y - self.min.y) as usize
            * (self.max.z - self.min.z) as usize
    }

    /// Coordinates in buffer order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> {
        let Region { min, max } = *self;
        (min.z..max.z).flat_map(move |z| {
            (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| Coord::new(x, y, z)))
        })
    }
}

/// Extract a region from the grid into a flat buffer.
///
/// # Returns
/// Number of bytes written, or 0 for an empty region or a buffer that is too small.
pub fn extract_region(grid: &SparseGrid, out_buf: &mut [u8], min: Coord, max: Coord) -> u64 {
    let Some(region) = Region::clamped(grid.extent(), min, max) else {
        return 0;
    };
    if out_buf.len() < region.volume() {
        return 0;
    }

    let mut offset = 0;
    for coord in region.coords() {
        out_buf[offset] = u8::from(grid.is_alive(coord));
        offset += 1;
    }

    offset as u64
}

/// Import a region from a flat buffer into the grid.
///
/// Input values are normalized: 0 = dead, any non-zero = alive.
///
/// # Returns
/// Number of bytes read, or 0 for an empty region or a buffer that is too short.
pub fn import_region(grid: &mut SparseGrid, in_buf: &[u8], min: Coord, max: Coord) -> u64 {
    let Some(region) = Region::clamped(grid.extent(), min, max) else {
        return 0;
    };
    if in_buf.len() < region.volume() {
        return 0;
    }

    let mut offset = 0;
    for coord in region.coords() {
        let result = if in_buf[offset] == 0 {
            grid.set_dead(coord)
        } else {
            grid.set_alive(coord)
        };
        debug_assert!(result.is_ok(), "clamped region yielded {result:?}");
        offset += 1;
    }

    offset as u64
}
