//! Cell mutation and queries.

use super::{write_coords, LifeHandle};
use crate::automaton::coord::Coord;

/// Marks a cell alive, binding a pooled instance to it.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
///
/// # Returns
/// 1 if the cell became alive, 0 if it already was or lies out of bounds
/// (the request is logged and ignored), -1 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn vl_add_cell(ptr: *mut LifeHandle, x: i32, y: i32, z: i32) -> i32 {
    if ptr.is_null() {
        return -1;
    }
    i32::from((*ptr).request_add_cell(Coord::new(x, y, z)))
}

/// Marks a cell dead, returning its instance to the pool.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
///
/// # Returns
/// 1 if the cell died, 0 if it already was dead or lies out of bounds, -1 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn vl_remove_cell(ptr: *mut LifeHandle, x: i32, y: i32, z: i32) -> i32 {
    if ptr.is_null() {
        return -1;
    }
    i32::from((*ptr).request_remove_cell(Coord::new(x, y, z)))
}

/// Gets the state of a cell (0 = dead, 1 = alive).
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
///
/// # Returns
/// 0 if out of bounds, null pointer, or dead; 1 if alive.
#[no_mangle]
pub unsafe extern "C" fn vl_is_alive(ptr: *const LifeHandle, x: i32, y: i32, z: i32) -> u8 {
    if ptr.is_null() {
        return 0;
    }
    u8::from((*ptr).is_alive(Coord::new(x, y, z)))
}

/// Number of live cells, or 0 on null pointer.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
#[no_mangle]
pub unsafe extern "C" fn vl_live_count(ptr: *const LifeHandle) -> u64 {
    if ptr.is_null() {
        return 0;
    }
    (*ptr).live_count() as u64
}

/// Number of generations stepped, or 0 on null pointer.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
#[no_mangle]
pub unsafe extern "C" fn vl_cycle_count(ptr: *const LifeHandle) -> u64 {
    if ptr.is_null() {
        return 0;
    }
    (*ptr).cycle_count()
}

/// Copies live cell coordinates as `x, y, z` triples, in sorted order.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
/// - `out` must point to at least `3 * capacity` writable `i32`s
///
/// # Returns
/// Number of cells written (at most `capacity`).
#[no_mangle]
pub unsafe extern "C" fn vl_copy_live_cells(
    ptr: *const LifeHandle,
    out: *mut i32,
    capacity: u64,
) -> u64 {
    if ptr.is_null() || out.is_null() {
        return 0;
    }
    write_coords((*ptr).live_cells(), out, capacity)
}
