/// Liveness of one pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Available for the next request
    Free,
    /// Handed out and not yet released
    InUse,
}

/// Logical handle to a pooled entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle(usize);

impl PoolHandle {
    /// Slot index of this handle
    pub fn index(&self) -> usize {
        self.0
    }
}

struct PoolSlot<T> {
    state: SlotState,
    entity: T,
}

/// Fixed-capacity pool of pre-built entities.
///
/// All entities are created up front from a prototype and handed out
/// round-robin: the search for a free entity starts just after the last
/// index returned, so recently released entities are reused last.
/// Exhaustion is not an error; the getters return `None` and the caller
/// decides whether to skip or retry next frame.
///
/// # Example
///
/// ```
/// use strato_engine::strato::pool::ObjectPool;
///
/// #[derive(Clone, Default)]
/// struct Missile { fuel: f32 }
///
/// let mut pool = ObjectPool::new(2, &Missile { fuel: 30.0 });
/// let a = pool.get_available_handle().unwrap();
/// let _b = pool.get_available_handle().unwrap();
/// assert!(pool.get_available_handle().is_none());
///
/// pool.release(a);
/// assert_eq!(pool.get_available_handle(), Some(a));
/// ```
pub struct ObjectPool<T> {
    slots: Vec<PoolSlot<T>>,
    last_index: Option<usize>,
}

impl<T: Clone> ObjectPool<T> {
    /// Create `capacity` free copies of `prototype`
    pub fn new(capacity: usize, prototype: &T) -> Self {
        Self::from_fn(capacity, |_| prototype.clone())
    }
}

impl<T> ObjectPool<T> {
    /// Create `capacity` free entities built by `make(index)`
    pub fn from_fn<F: FnMut(usize) -> T>(capacity: usize, mut make: F) -> Self {
        let slots = (0..capacity)
            .map(|index| PoolSlot {
                state: SlotState::Free,
                entity: make(index),
            })
            .collect();

        crate::engine_debug!("strato::ObjectPool", "Created pool of {} entities", capacity);

        Self {
            slots,
            last_index: None,
        }
    }

    /// Number of entities, fixed at construction
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of entities currently in use
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.state == SlotState::InUse).count()
    }

    /// Next free index after the last one returned, without claiming it.
    ///
    /// Scans one full circuit; `None` when every entity is in use.
    pub fn get_available_index(&mut self) -> Option<usize> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return None;
        }

        let start = self.last_index.map_or(0, |last| (last + 1) % capacity);
        let found = (0..capacity)
            .map(|step| (start + step) % capacity)
            .find(|&index| self.slots[index].state == SlotState::Free)?;

        self.last_index = Some(found);
        Some(found)
    }

    /// Claim the next free entity and return its handle
    pub fn get_available_handle(&mut self) -> Option<PoolHandle> {
        let index = self.get_available_index()?;
        self.slots[index].state = SlotState::InUse;
        Some(PoolHandle(index))
    }

    /// Claim the next free entity and return it with its handle
    pub fn get_available_entity(&mut self) -> Option<(PoolHandle, &mut T)> {
        let handle = self.get_available_handle()?;
        Some((handle, &mut self.slots[handle.0].entity))
    }

    /// Return an entity to the pool.
    ///
    /// Returns false if the handle is out of range or already free.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        match self.slots.get_mut(handle.0) {
            Some(slot) if slot.state == SlotState::InUse => {
                slot.state = SlotState::Free;
                true
            }
            _ => false,
        }
    }

    /// Handles of all entities in use, in index order
    pub fn get_all_active_handles(&self) -> Vec<PoolHandle> {
        let active = self.active_count();

        let mut handles = Vec::with_capacity(active);
        if active > 0 {
            handles.extend(
                self.slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.state == SlotState::InUse)
                    .map(|(index, _)| PoolHandle(index)),
            );
        }
        handles
    }

    /// Entity behind `handle`, in use or not
    pub fn entity(&self, handle: PoolHandle) -> Option<&T> {
        self.slots.get(handle.0).map(|slot| &slot.entity)
    }

    /// Mutable entity behind `handle`, in use or not
    pub fn entity_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots.get_mut(handle.0).map(|slot| &mut slot.entity)
    }

    /// Liveness of the slot behind `handle`
    pub fn state(&self, handle: PoolHandle) -> Option<SlotState> {
        self.slots.get(handle.0).map(|slot| slot.state)
    }

    /// Handle for a raw index, if in range
    pub fn handle(&self, index: usize) -> Option<PoolHandle> {
        (index < self.slots.len()).then_some(PoolHandle(index))
    }

    /// Iterate over entities in use
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.state == SlotState::InUse)
            .map(|(index, slot)| (PoolHandle(index), &slot.entity))
    }
}

#[cfg(test)]
#[path = "object_pool_tests.rs"]
mod tests;
