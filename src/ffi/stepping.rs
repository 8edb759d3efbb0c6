//! Stepping, cadence control and the per-step delta feed.

use std::time::Duration;

use super::{write_coords, LifeHandle};

/// Runs one generation immediately, regardless of the run state.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
///
/// # Returns
/// Number of cells that changed state, or 0 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn vl_step(ptr: *mut LifeHandle) -> u64 {
    if ptr.is_null() {
        return 0;
    }
    (*ptr).step().len() as u64
}

/// Advances the cadence by `elapsed_us` microseconds and runs due steps.
///
/// After this call `vl_copy_added` / `vl_copy_removed` describe the last step run.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
///
/// # Returns
/// Number of steps run.
#[no_mangle]
pub unsafe extern "C" fn vl_tick(ptr: *mut LifeHandle, elapsed_us: u64) -> u32 {
    if ptr.is_null() {
        return 0;
    }
    (*ptr).tick(Duration::from_micros(elapsed_us)).len() as u32
}

/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
#[no_mangle]
pub unsafe extern "C" fn vl_start(ptr: *mut LifeHandle) {
    if !ptr.is_null() {
        (*ptr).start();
    }
}

/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
#[no_mangle]
pub unsafe extern "C" fn vl_pause(ptr: *mut LifeHandle) {
    if !ptr.is_null() {
        (*ptr).pause();
    }
}

/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
#[no_mangle]
pub unsafe extern "C" fn vl_resume(ptr: *mut LifeHandle) {
    if !ptr.is_null() {
        (*ptr).resume();
    }
}

/// Query whether the simulation is running.
/// Returns 1 if running, 0 if stopped or paused, -1 if null pointer.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
#[no_mangle]
pub unsafe extern "C" fn vl_is_running(ptr: *const LifeHandle) -> i32 {
    if ptr.is_null() {
        return -1;
    }
    i32::from((*ptr).is_running())
}

/// Sets the stepping rate.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
///
/// # Returns
/// 0 on success, 1 if the rate is not finite and positive, -1 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn vl_set_speed(ptr: *mut LifeHandle, steps_per_second: f64) -> i32 {
    if ptr.is_null() {
        return -1;
    }
    match (*ptr).set_speed(steps_per_second) {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// Copies the cells born in the last step as sorted `x, y, z` triples.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
/// - `out` must point to at least `3 * capacity` writable `i32`s
///
/// # Returns
/// Number of cells written (at most `capacity`).
#[no_mangle]
pub unsafe extern "C" fn vl_copy_added(ptr: *const LifeHandle, out: *mut i32, capacity: u64) -> u64 {
    if ptr.is_null() || out.is_null() {
        return 0;
    }
    write_coords((*ptr).last_delta().added.iter().copied(), out, capacity)
}

/// Copies the cells that died in the last step as sorted `x, y, z` triples.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
/// - `out` must point to at least `3 * capacity` writable `i32`s
///
/// # Returns
/// Number of cells written (at most `capacity`).
#[no_mangle]
pub unsafe extern "C" fn vl_copy_removed(
    ptr: *const LifeHandle,
    out: *mut i32,
    capacity: u64,
) -> u64 {
    if ptr.is_null() || out.is_null() {
        return 0;
    }
    write_coords((*ptr).last_delta().removed.iter().copied(), out, capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ffi::cells::{vl_add_cell, vl_cycle_count, vl_is_alive};
    use crate::ffi::lifecycle::{vl_create, vl_destroy};
    use std::ptr;

    #[test]
    fn test_step_and_delta_feed() {
        unsafe {
            let sim = vl_create(10);
            // Six face neighbors around (5,5,5): the center is born, the ring dies
            for (x, y, z) in [(6, 5, 5), (4, 5, 5), (5, 6, 5), (5, 4, 5), (5, 5, 6), (5, 5, 4)] {
                vl_add_cell(sim, x, y, z);
            }

            assert_eq!(vl_step(sim), 7);
            assert_eq!(vl_cycle_count(sim), 1);
            assert_eq!(vl_is_alive(sim, 5, 5, 5), 1);

            let mut added = vec![0i32; 3];
            assert_eq!(vl_copy_added(sim, added.as_mut_ptr(), 1), 1);
            assert_eq!(added, vec![5, 5, 5]);

            let mut removed = vec![0i32; 18];
            assert_eq!(vl_copy_removed(sim, removed.as_mut_ptr(), 6), 6);
            assert_eq!(&removed[..3], &[4, 5, 5]);

            vl_destroy(sim);
        }
    }

    #[test]
    fn test_tick_respects_run_state() {
        unsafe {
            let sim = vl_create(8);
            assert_eq!(vl_set_speed(sim, 2.0), 0);
            assert_eq!(vl_set_speed(sim, 0.0), 1);

            assert_eq!(vl_is_running(sim), 0);
            assert_eq!(vl_tick(sim, 1_000_000), 0);

            vl_start(sim);
            assert_eq!(vl_is_running(sim), 1);
            assert_eq!(vl_tick(sim, 1_000_000), 2);

            vl_pause(sim);
            assert_eq!(vl_tick(sim, 1_000_000), 0);

            vl_resume(sim);
            assert_eq!(vl_tick(sim, 500_000), 1);
            assert_eq!(vl_cycle_count(sim), 3);

            vl_destroy(sim);
        }
    }

    #[test]
    fn test_null_pointer_safety() {
        unsafe {
            assert_eq!(vl_step(ptr::null_mut()), 0);
            assert_eq!(vl_tick(ptr::null_mut(), 1000), 0);
            vl_start(ptr::null_mut());
            vl_pause(ptr::null_mut());
            vl_resume(ptr::null_mut());
            assert_eq!(vl_is_running(ptr::null()), -1);
            assert_eq!(vl_set_speed(ptr::null_mut(), 1.0), -1);
            assert_eq!(vl_copy_added(ptr::null(), ptr::null_mut(), 1), 0);
            assert_eq!(vl_copy_removed(ptr::null(), ptr::null_mut(), 1), 0);
        }
    }
}
