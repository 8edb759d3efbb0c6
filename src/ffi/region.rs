//! Region extraction and import FFI functions.

use super::LifeHandle;
use crate::automaton::coord::Coord;

/// Bytes a caller must supply for the box `[min, max)` before clamping.
fn requested_len(min: Coord, max: Coord) -> usize {
    let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo)).max(0) as usize;
    span(min.x, max.x)
        .saturating_mul(span(min.y, max.y))
        .saturating_mul(span(min.z, max.z))
}

/// Extracts a rectangular region of cells into a flat output buffer.
///
/// # Layout
/// The buffer is filled in z,y,x order (z changes slowest, x changes fastest),
/// one byte per cell. The box is clamped to the grid first.
/// This matches the layout expected by `vl_import_region`.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
/// - `out_buf` must point to a buffer with at least
///   `(max_x - min_x) * (max_y - min_y) * (max_z - min_z)` bytes
///
/// # Returns
/// Number of bytes written, or 0 on error.
#[no_mangle]
pub unsafe extern "C" fn vl_extract_region(
    ptr: *const LifeHandle,
    out_buf: *mut u8,
    min_x: i32,
    min_y: i32,
    min_z: i32,
    max_x: i32,
    max_y: i32,
    max_z: i32,
) -> u64 {
    if ptr.is_null() || out_buf.is_null() {
        return 0;
    }

    let min = Coord::new(min_x, min_y, min_z);
    let max = Coord::new(max_x, max_y, max_z);
    let len = requested_len(min, max);
    if len == 0 {
        return 0;
    }

    let buf_slice = std::slice::from_raw_parts_mut(out_buf, len);
    (*ptr).extract_region(buf_slice, min, max)
}

/// Imports a rectangular region of cells from a flat buffer.
///
/// # Layout
/// The buffer is expected to be in z,y,x order (matching `vl_extract_region`).
/// Input values are normalized: 0 = dead, non-zero = alive.
/// Cells that change keep their pooled instances bound.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
/// - `in_buf` must point to a buffer with at least
///   `(max_x - min_x) * (max_y - min_y) * (max_z - min_z)` bytes
///
/// # Returns
/// Number of bytes read, or 0 on error.
#[no_mangle]
pub unsafe extern "C" fn vl_import_region(
    ptr: *mut LifeHandle,
    in_buf: *const u8,
    min_x: i32,
    min_y: i32,
    min_z: i32,
    max_x: i32,
    max_y: i32,
    max_z: i32,
) -> u64 {
    if ptr.is_null() || in_buf.is_null() {
        return 0;
    }

    let min = Coord::new(min_x, min_y, min_z);
    let max = Coord::new(max_x, max_y, max_z);
    let len = requested_len(min, max);
    if len == 0 {
        return 0;
    }

    let buf_slice = std::slice::from_raw_parts(in_buf, len);
    (*ptr).import_region(buf_slice, min, max)
}
