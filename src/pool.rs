//! Reusable-instance pool backing the visual representation of live cells.
//!
//! Instances live in a slot vector and are addressed by generational
//! [`InstanceId`]s. Released instances go back to a FIFO free queue instead of
//! being dropped, so births and deaths at high churn do not allocate.
//!
//! Sizing adapts to the grid: small grids reserve more per unit of volume,
//! large grids are capped. `max_size` may grow on demand, but never past
//! twice the default size.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::automaton::coord::{MAX_GRID_SIZE, MIN_GRID_SIZE};
use crate::error::{LifeError, LifeResult};

/// Upper bound on `max_size` growth per exhausted acquire.
pub const GROWTH_STEP: usize = 100;

/// Instances constructed per prewarm tick.
pub const PREWARM_BATCH: usize = 64;

/// Largest accepted `PoolSizing::ceiling`.
pub const MAX_POOL_CEILING: usize = 100_000;

static NEXT_POOL_TAG: AtomicU32 = AtomicU32::new(0);

/// Volume reserve rate at the smallest grid size.
const SMALL_GRID_RATE: f64 = 0.25;
/// Volume reserve rate at the largest grid size.
const LARGE_GRID_RATE: f64 = 0.05;

/// Something the pool can hand out again after use.
pub trait Recycle {
    /// Return to a neutral state before going back to the free queue.
    fn recycle(&mut self);
}

/// Sizing parameters for [`InstancePool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSizing {
    /// Constant part of the default size.
    pub base: usize,
    /// Lower clamp of the default size.
    pub floor: usize,
    /// Upper clamp of the default size.
    pub ceiling: usize,
}

impl Default for PoolSizing {
    fn default() -> Self {
        PoolSizing {
            base: 100,
            floor: 100,
            ceiling: 3000,
        }
    }
}

impl PoolSizing {
    /// Default pool size for a grid of `grid_size` cells per axis.
    ///
    /// `base + ceil(rate * grid_size³)`, where `rate` falls linearly from 0.25 at
    /// the smallest grid to 0.05 at the largest, clamped to `[floor, ceiling]`.
    pub fn default_size(&self, grid_size: u32) -> usize {
        let clamped = grid_size.clamp(MIN_GRID_SIZE, MAX_GRID_SIZE);
        let t = (clamped - MIN_GRID_SIZE) as f64 / (MAX_GRID_SIZE - MIN_GRID_SIZE) as f64;
        let rate = SMALL_GRID_RATE + (LARGE_GRID_RATE - SMALL_GRID_RATE) * t;
        let volume = (grid_size as f64).powi(3);
        let reserve = (rate * volume).ceil() as usize;
        self.base
            .saturating_add(reserve)
            .max(self.floor)
            .min(self.ceiling)
    }

    pub fn validate(&self) -> LifeResult<()> {
        if self.floor == 0 || self.floor > self.ceiling {
            return Err(LifeError::InvalidConfiguration(format!(
                "pool bounds {}..={} must satisfy 0 < floor <= ceiling",
                self.floor, self.ceiling
            )));
        }
        if self.ceiling > MAX_POOL_CEILING {
            return Err(LifeError::InvalidConfiguration(format!(
                "pool ceiling {} exceeds {MAX_POOL_CEILING}",
                self.ceiling
            )));
        }
        if self.base > self.ceiling {
            return Err(LifeError::InvalidConfiguration(format!(
                "pool base {} exceeds ceiling {}",
                self.base, self.ceiling
            )));
        }
        Ok(())
    }
}

/// Generational handle to a pooled instance, valid only in the pool that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId {
    pool: u32,
    index: u32,
    generation: u32,
}

impl InstanceId {
    /// Slot index, stable for as long as the instance exists.
    #[inline]
    pub fn index(&self) -> u32 {
        self.index
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SlotState {
    Inactive,
    Active,
    /// Retired by a shrinking reconfigure; index waits for reuse.
    Vacant,
}

struct Slot<T> {
    value: Option<T>,
    generation: u32,
    state: SlotState,
}

/// Point-in-time pool counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub active: usize,
    pub inactive: usize,
    pub max_size: usize,
    pub default_size: usize,
}

/// Arena of reusable instances with a FIFO free queue.
///
/// Every constructed instance is either active (handed out, tracked by slot
/// state) or inactive (queued in `inactive`), never both.
pub struct InstancePool<T> {
    /// Stamped into every issued id.
    tag: u32,
    slots: Vec<Slot<T>>,
    inactive: VecDeque<u32>,
    vacant: Vec<u32>,
    active_count: usize,
    sizing: PoolSizing,
    default_size: usize,
    max_size: usize,
    /// Instances still to construct for the current prewarm request.
    prewarm_pending: usize,
}

impl<T: Recycle + Default> InstancePool<T> {
    /// Create an empty pool sized for `grid_size`.
    pub fn new(sizing: PoolSizing, grid_size: u32) -> Self {
        let default_size = sizing.default_size(grid_size);
        InstancePool {
            tag: NEXT_POOL_TAG.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            inactive: VecDeque::new(),
            vacant: Vec::new(),
            active_count: 0,
            sizing,
            default_size,
            max_size: default_size,
            prewarm_pending: 0,
        }
    }

    /// Recompute the sizes for a new grid size.
    ///
    /// Surplus inactive instances are retired until the total fits the new
    /// cap. Fails without changing anything if the active instances alone
    /// exceed twice the new default size.
    pub fn configure(&mut self, grid_size: u32) -> LifeResult<()> {
        let default_size = self.sizing.default_size(grid_size);
        let limit = default_size.saturating_mul(2);
        if self.active_count > limit {
            return Err(LifeError::InvalidConfiguration(format!(
                "{} active instances exceed the pool limit of {limit} for grid size {grid_size}",
                self.active_count
            )));
        }

        self.default_size = default_size;
        self.max_size = default_size.max(self.active_count);

        let mut retired = 0;
        while self.total() > self.max_size {
            let Some(index) = self.inactive.pop_back() else {
                break;
            };
            let slot = &mut self.slots[index as usize];
            slot.value = None;
            slot.state = SlotState::Vacant;
            self.vacant.push(index);
            retired += 1;
        }
        self.prewarm_pending = self.prewarm_pending.min(self.max_size - self.total());

        debug!(
            grid_size,
            default_size = self.default_size,
            retired,
            "instance pool configured"
        );
        Ok(())
    }

    /// Replace the sizing parameters and recompute for `grid_size`.
    pub fn set_sizing(&mut self, sizing: PoolSizing, grid_size: u32) -> LifeResult<()> {
        sizing.validate()?;
        let previous = std::mem::replace(&mut self.sizing, sizing);
        self.configure(grid_size).inspect_err(|_| self.sizing = previous)
    }

    /// Hand out an instance, reusing an inactive one when possible.
    pub fn acquire(&mut self) -> LifeResult<InstanceId> {
        if let Some(index) = self.inactive.pop_front() {
            return Ok(self.activate(index));
        }

        if self.total() >= self.max_size {
            let grown = (self.max_size + GROWTH_STEP.min(self.default_size)).min(self.hard_cap());
            if grown > self.max_size {
                debug!(from = self.max_size, to = grown, "instance pool grown");
                self.max_size = grown;
            }
        }
        if self.total() >= self.max_size {
            return Err(LifeError::PoolExhausted {
                capacity: self.max_size,
            });
        }

        let index = self.construct();
        Ok(self.activate(index))
    }

    /// Take an active instance back, recycling it for later reuse.
    pub fn release(&mut self, id: InstanceId) -> LifeResult<()> {
        if id.pool != self.tag {
            return Err(LifeError::NotOwned(id));
        }
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|s| s.state == SlotState::Active && s.generation == id.generation)
            .ok_or(LifeError::NotOwned(id))?;

        if let Some(value) = slot.value.as_mut() {
            value.recycle();
        }
        slot.state = SlotState::Inactive;
        self.active_count -= 1;
        self.inactive.push_back(id.index);
        Ok(())
    }

    /// Release every active instance. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let mut released = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.state != SlotState::Active {
                continue;
            }
            if let Some(value) = slot.value.as_mut() {
                value.recycle();
            }
            slot.state = SlotState::Inactive;
            self.inactive.push_back(index as u32);
            released += 1;
        }
        self.active_count = 0;
        released
    }

    /// Schedule construction of up to `count` inactive instances.
    pub fn request_prewarm(&mut self, count: usize) {
        self.prewarm_pending = count;
    }

    /// Construct at most one batch toward the pending prewarm request.
    /// Returns true once nothing is left to construct.
    pub fn prewarm_tick(&mut self) -> bool {
        let room = self.max_size.saturating_sub(self.total());
        let batch = self.prewarm_pending.min(PREWARM_BATCH).min(room);

        self.slots.reserve(batch.saturating_sub(self.vacant.len()));
        for _ in 0..batch {
            let index = self.construct();
            self.inactive.push_back(index);
        }

        self.prewarm_pending = if batch == room {
            0
        } else {
            self.prewarm_pending - batch
        };
        trace!(batch, pending = self.prewarm_pending, "prewarm batch");
        self.prewarm_pending == 0
    }

    /// Construct up to `count` inactive instances now, in batches.
    /// Returns how many were constructed.
    pub fn prewarm(&mut self, count: usize) -> usize {
        let before = self.total();
        self.request_prewarm(count);
        while !self.prewarm_tick() {}
        self.total() - before
    }

    fn construct(&mut self) -> u32 {
        let value = Some(T::default());
        if let Some(index) = self.vacant.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = value;
            slot.state = SlotState::Inactive;
            return index;
        }
        self.slots.push(Slot {
            value,
            generation: 0,
            state: SlotState::Inactive,
        });
        (self.slots.len() - 1) as u32
    }

    fn activate(&mut self, index: u32) -> InstanceId {
        let slot = &mut self.slots[index as usize];
        slot.generation = slot.generation.wrapping_add(1);
        slot.state = SlotState::Active;
        self.active_count += 1;
        InstanceId {
            pool: self.tag,
            index,
            generation: slot.generation,
        }
    }
}

impl<T> InstancePool<T> {
    /// Borrow an active instance.
    pub fn get(&self, id: InstanceId) -> Option<&T> {
        self.active_slot(id).and_then(|s| s.value.as_ref())
    }

    /// Mutably borrow an active instance.
    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut T> {
        if id.pool != self.tag {
            return None;
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.state == SlotState::Active && s.generation == id.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn is_active(&self, id: InstanceId) -> bool {
        self.active_slot(id).is_some()
    }

    fn active_slot(&self, id: InstanceId) -> Option<&Slot<T>> {
        if id.pool != self.tag {
            return None;
        }
        self.slots
            .get(id.index as usize)
            .filter(|s| s.state == SlotState::Active && s.generation == id.generation)
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active_count
    }

    #[inline]
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// Constructed instances, active or inactive.
    #[inline]
    pub fn total(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    #[inline]
    pub fn default_size(&self) -> usize {
        self.default_size
    }

    /// Ceiling that `max_size` never exceeds.
    #[inline]
    pub fn hard_cap(&self) -> usize {
        self.default_size.saturating_mul(2)
    }

    pub fn sizing(&self) -> PoolSizing {
        self.sizing
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            active: self.active_count,
            inactive: self.inactive.len(),
            max_size: self.max_size,
            default_size: self.default_size,
        }
    }
}

/// An [`InstancePool`] behind a mutex, for hosts that acquire and release from
/// more than one thread.
pub struct SharedPool<T> {
    inner: Arc<Mutex<InstancePool<T>>>,
}

impl<T> Clone for SharedPool<T> {
    fn clone(&self) -> Self {
        SharedPool {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Recycle + Default> SharedPool<T> {
    pub fn new(pool: InstancePool<T>) -> Self {
        SharedPool {
            inner: Arc::new(Mutex::new(pool)),
        }
    }

    pub fn acquire(&self) -> LifeResult<InstanceId> {
        self.inner.lock().acquire()
    }

    pub fn release(&self, id: InstanceId) -> LifeResult<()> {
        self.inner.lock().release(id)
    }

    pub fn stats(&self) -> PoolStats {
        self.inner.lock().stats()
    }

    /// Run `f` with exclusive access to the pool.
    pub fn with<R>(&self, f: impl FnOnce(&mut InstancePool<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
