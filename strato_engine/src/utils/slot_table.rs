/// Dense table of occupied/free slots.
///
/// Slots are tombstoned on free and reused by the next allocation
/// (first free slot by linear scan), so indices never move and the table
/// never shrinks. Used by the execution pool, whose admission window walks
/// the table in index order.
///
/// # Example
///
/// ```ignore
/// let mut table = SlotTable::new();
/// let a = table.alloc();  // 0
/// let b = table.alloc();  // 1
/// table.free(a);          // 0 tombstoned
/// let c = table.alloc();  // 0 (reused)
/// ```
#[derive(Debug, Default, Clone)]
pub struct SlotTable {
    occupied: Vec<bool>,
    count: usize,
}

impl SlotTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            occupied: Vec::new(),
            count: 0,
        }
    }

    /// Occupy the first free slot, appending one if none is free
    pub fn alloc(&mut self) -> usize {
        self.count += 1;
        match self.occupied.iter().position(|used| !used) {
            Some(index) => {
                self.occupied[index] = true;
                index
            }
            None => {
                self.occupied.push(true);
                self.occupied.len() - 1
            }
        }
    }

    /// Tombstone a slot.
    ///
    /// Returns false if the slot is out of range or already free.
    pub fn free(&mut self, index: usize) -> bool {
        match self.occupied.get_mut(index) {
            Some(used) if *used => {
                *used = false;
                self.count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Whether the slot at `index` is occupied
    pub fn is_occupied(&self, index: usize) -> bool {
        self.occupied.get(index).copied().unwrap_or(false)
    }

    /// Table size, occupied and free slots included
    pub fn len(&self) -> usize {
        self.occupied.len()
    }

    /// Whether the table has no slots at all
    pub fn is_empty(&self) -> bool {
        self.occupied.is_empty()
    }

    /// Number of occupied slots
    pub fn occupied(&self) -> usize {
        self.count
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_table_tests.rs"]
mod tests;
