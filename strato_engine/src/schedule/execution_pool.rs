/// Frame-throttled admission of registered agents.
///
/// Each registered agent owns one slot of a dense [`SlotTable`]. Every frame
/// the pool moves a circular admission window `[min, max)` forward over the
/// table until it has covered `requests_per_frame` occupied slots, or gone
/// all the way around. Agents check [`Registration::is_scheduled`] during
/// their fixed step and only run their expensive logic when admitted.
///
/// Every agent is admitted within `ceil(registered / requests_per_frame)`
/// frames, and one advance never covers more than `requests_per_frame`
/// occupied slots.

use std::sync::{Arc, Mutex, MutexGuard};
use crate::utils::SlotTable;

struct PoolState {
    requests_per_frame: usize,
    slots: SlotTable,
    min_index: usize,
    max_index: usize,
}

impl PoolState {
    fn advance(&mut self) {
        let count = self.slots.len();
        if count == 0 {
            return;
        }

        self.min_index = self.max_index;

        let mut admitted = 0;
        loop {
            if self.slots.is_occupied(self.max_index) {
                admitted += 1;
            }
            self.max_index = (self.max_index + 1) % count;

            if admitted >= self.requests_per_frame || self.max_index == self.min_index {
                break;
            }
        }
    }

    fn is_scheduled(&self, index: usize) -> bool {
        if self.min_index < self.max_index {
            index >= self.min_index && index < self.max_index
        } else {
            // Wrapped window, or a full circuit when min == max
            index >= self.min_index || index < self.max_index
        }
    }
}

/// Shared handle to an execution pool
///
/// Cloning the handle shares the same pool. A [`FrameScheduler`] holds one
/// clone to advance it; agents hold [`Registration`]s.
///
/// [`FrameScheduler`]: super::FrameScheduler
///
/// # Example
///
/// ```
/// use strato_engine::strato::schedule::{ExecutionPool, FrameScheduler};
///
/// let pool = ExecutionPool::new(2);
/// let mut scheduler = FrameScheduler::new(vec![pool.clone()]);
///
/// let agents: Vec<_> = (0..4).map(|_| pool.register()).collect();
/// scheduler.advance_frame();
///
/// let admitted = agents.iter().filter(|a| a.is_scheduled()).count();
/// assert_eq!(admitted, 2);
/// ```
#[derive(Clone)]
pub struct ExecutionPool {
    state: Arc<Mutex<PoolState>>,
}

impl ExecutionPool {
    /// Create a pool admitting `requests_per_frame` agents per frame (at least one)
    pub fn new(requests_per_frame: usize) -> Self {
        if requests_per_frame == 0 {
            crate::engine_warn!("strato::ExecutionPool",
                "requests_per_frame of 0 clamped to 1");
        }

        Self {
            state: Arc::new(Mutex::new(PoolState {
                requests_per_frame: requests_per_frame.max(1),
                slots: SlotTable::new(),
                min_index: 0,
                max_index: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        // Pool state stays consistent across a panic in another holder
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an agent; the slot is released when the registration drops
    pub fn register(&self) -> Registration {
        let index = self.state().slots.alloc();
        Registration {
            pool: self.clone(),
            index: Some(index),
        }
    }

    fn unregister(&self, index: usize) {
        if !self.state().slots.free(index) {
            crate::engine_warn!("strato::ExecutionPool",
                "Slot {} was not registered", index);
        }
    }

    /// Whether `index` lies in the current admission window
    pub fn is_scheduled(&self, index: usize) -> bool {
        self.state().is_scheduled(index)
    }

    /// Move the admission window forward by one frame's quota
    pub fn advance_frame(&self) {
        let mut state = self.state();
        state.advance();
        crate::engine_trace!("strato::ExecutionPool",
            "Admission window [{}, {}) over {} slots",
            state.min_index, state.max_index, state.slots.len());
    }

    /// Admission quota per frame
    pub fn requests_per_frame(&self) -> usize {
        self.state().requests_per_frame
    }

    /// Number of live registrations
    pub fn registered_count(&self) -> usize {
        self.state().slots.occupied()
    }

    /// Slot table size (live and tombstoned slots)
    pub fn table_len(&self) -> usize {
        self.state().slots.len()
    }

    /// Current admission window as `(min, max)`
    pub fn window(&self) -> (usize, usize) {
        let state = self.state();
        (state.min_index, state.max_index)
    }

    /// Whether two handles refer to the same pool
    pub fn ptr_eq(&self, other: &ExecutionPool) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// Scoped registration in an [`ExecutionPool`]
///
/// Holds one slot until dropped or explicitly unregistered.
pub struct Registration {
    pool: ExecutionPool,
    index: Option<usize>,
}

impl Registration {
    /// Slot index, or `None` once unregistered
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Whether this agent may run its expensive logic this frame
    pub fn is_scheduled(&self) -> bool {
        match self.index {
            Some(index) => self.pool.is_scheduled(index),
            None => false,
        }
    }

    /// Release the slot now; later calls and the drop are no-ops
    pub fn unregister(&mut self) {
        if let Some(index) = self.index.take() {
            self.pool.unregister(index);
        }
    }

    /// Pool this registration belongs to
    pub fn pool(&self) -> &ExecutionPool {
        &self.pool
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.unregister();
    }
}

#[cfg(test)]
#[path = "execution_pool_tests.rs"]
mod tests;
