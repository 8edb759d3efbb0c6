//! Simulation creation, destruction, reset and resize.

use std::ffi::{c_char, CStr};

use tracing::warn;

use super::LifeHandle;
use crate::config::LifeConfig;

/// Creates a simulation with default settings and the given grid size.
///
/// # Returns
/// A pointer to a new simulation, or null if the grid size is outside 5..=50.
///
/// # Safety
/// The returned pointer must eventually be freed with `vl_destroy()`.
#[no_mangle]
pub extern "C" fn vl_create(grid_size: u32) -> *mut LifeHandle {
    let config = LifeConfig {
        grid_size,
        ..LifeConfig::default()
    };
    match LifeHandle::new(config) {
        Ok(sim) => Box::into_raw(Box::new(sim)),
        Err(e) => {
            warn!(%e, "vl_create rejected configuration");
            std::ptr::null_mut()
        }
    }
}

/// Creates a simulation from a JSON configuration document.
///
/// # Safety
/// - `json` must be a valid NUL-terminated string, or null
///
/// # Returns
/// A pointer to a new simulation, or null on a parse or validation error.
#[no_mangle]
pub unsafe extern "C" fn vl_create_from_json(json: *const c_char) -> *mut LifeHandle {
    if json.is_null() {
        return std::ptr::null_mut();
    }
    let Ok(text) = CStr::from_ptr(json).to_str() else {
        return std::ptr::null_mut();
    };

    match LifeConfig::from_json(text).and_then(LifeHandle::new) {
        Ok(sim) => Box::into_raw(Box::new(sim)),
        Err(e) => {
            warn!(%e, "vl_create_from_json rejected configuration");
            std::ptr::null_mut()
        }
    }
}

/// Destroys a simulation and frees its memory.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `vl_create*()`, or null
/// - `ptr` must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn vl_destroy(ptr: *mut LifeHandle) {
    if !ptr.is_null() {
        drop(Box::from_raw(ptr));
    }
}

/// Clears all cells and the cycle counter.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
#[no_mangle]
pub unsafe extern "C" fn vl_reset(ptr: *mut LifeHandle) {
    if ptr.is_null() {
        return;
    }
    (*ptr).reset();
}

/// Changes the grid size, dropping cells outside the new extent.
///
/// # Safety
/// - `ptr` must be a valid simulation pointer, or null
///
/// # Returns
/// 0 on success, 1 if the size is rejected (previous size kept), -1 on null pointer.
#[no_mangle]
pub unsafe extern "C" fn vl_resize(ptr: *mut LifeHandle, grid_size: u32) -> i32 {
    if ptr.is_null() {
        return -1;
    }
    match (*ptr).resize(grid_size) {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
