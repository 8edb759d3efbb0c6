//! C FFI layer for host engines.
//!
//! This module exports C ABI functions for use from LuaJIT FFI or any other C caller.
//! All functions are marked with `#[no_mangle]` and use `extern "C"`.
//!
//! The actual logic is in the `controller` and `automaton` modules. These functions
//! are thin wrappers that handle null checks, pointer safety, and C-to-Rust conversions.
//! Coordinate lists cross the boundary as flat `x, y, z` triples of `i32`, sorted.

use crate::automaton::coord::Coord;
use crate::controller::{CellMarker, Simulation};

pub mod cells;
pub mod lifecycle;
pub mod region;
pub mod stepping;

/// Opaque simulation handle handed to C callers.
pub type LifeHandle = Simulation<CellMarker>;

pub use cells::{
    vl_add_cell, vl_copy_live_cells, vl_cycle_count, vl_is_alive, vl_live_count, vl_remove_cell,
};
pub use lifecycle::{vl_create, vl_create_from_json, vl_destroy, vl_reset, vl_resize};
pub use region::{vl_extract_region, vl_import_region};
pub use stepping::{
    vl_copy_added, vl_copy_removed, vl_is_running, vl_pause, vl_resume, vl_set_speed, vl_start,
    vl_step, vl_tick,
};

/// Sort `coords` and write up to `capacity` of them to `out` as triples.
///
/// # Safety
/// `out` must point to at least `3 * capacity` writable `i32`s.
unsafe fn write_coords(coords: impl Iterator<Item = Coord>, out: *mut i32, capacity: u64) -> u64 {
    let mut sorted: Vec<Coord> = coords.collect();
    sorted.sort_unstable();

    let count = sorted.len().min(usize::try_from(capacity).unwrap_or(usize::MAX));
    let out = std::slice::from_raw_parts_mut(out, count * 3);
    for (chunk, coord) in out.chunks_exact_mut(3).zip(&sorted) {
        chunk[0] = coord.x;
        chunk[1] = coord.y;
        chunk[2] = coord.z;
    }
    count as u64
}
