use crate::descriptor::ResourceClass;
use crate::error::{Error, Result};

/// Hands out unique `u32` slot indices from a fixed-capacity pool.
///
/// One allocator backs each descriptor class. The free list is a stack
/// seeded so that a fresh allocator returns `0, 1, 2, ...`; afterwards the
/// most recently freed slot is handed out first.
///
/// Not internally synchronized: the owning device serializes access
/// through `&mut self`.
///
/// # Example
///
/// ```ignore
/// let mut alloc = IndexAllocator::new(ResourceClass::StorageBuffer, 4);
/// let a = alloc.allocate()?; // 0
/// let b = alloc.allocate()?; // 1
/// alloc.free(a)?;            // 0 is now available
/// let c = alloc.allocate()?; // 0 (recycled)
/// ```
pub struct IndexAllocator {
    class: ResourceClass,
    free_list: Vec<u32>,
    in_use: Vec<bool>,
    len: u32,
}

impl IndexAllocator {
    /// Create an allocator with every slot in `0..capacity` available
    pub fn new(class: ResourceClass, capacity: u32) -> Self {
        Self {
            class,
            free_list: (0..capacity).rev().collect(),
            in_use: vec![false; capacity as usize],
            len: 0,
        }
    }

    /// Take the next available slot
    pub fn allocate(&mut self) -> Result<u32> {
        let slot = self.free_list.pop().ok_or(Error::AllocatorExhausted {
            class: self.class,
            capacity: self.capacity(),
        })?;
        self.in_use[slot as usize] = true;
        self.len += 1;
        Ok(slot)
    }

    /// Return a slot to the pool
    ///
    /// Fails with [`Error::DoubleFree`] if the slot is out of range or not
    /// currently allocated; the pool is left untouched in that case.
    pub fn free(&mut self, slot: u32) -> Result<()> {
        match self.in_use.get_mut(slot as usize) {
            Some(used) if *used => {
                *used = false;
                self.len -= 1;
                self.free_list.push(slot);
                Ok(())
            }
            _ => Err(Error::DoubleFree {
                class: self.class,
                slot,
            }),
        }
    }

    /// Class this allocator serves
    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// Total number of slots
    pub fn capacity(&self) -> u32 {
        self.in_use.len() as u32
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether no slots are currently allocated
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots that can still be allocated
    pub fn available(&self) -> u32 {
        self.free_list.len() as u32
    }

    /// Whether `slot` is currently allocated
    pub fn is_allocated(&self, slot: u32) -> bool {
        self.in_use.get(slot as usize).copied().unwrap_or(false)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "index_allocator_tests.rs"]
mod tests;
