use std::fmt;
use std::sync::Arc;

use crate::deletion::RetireList;
use crate::descriptor::ResourceClass;

/// A retired descriptor slot waiting to go back to its allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSlot {
    pub class: ResourceClass,
    pub slot: u32,
}

/// Owning handle to one slot of the bindless descriptor table.
///
/// The slot index is what shaders use to address the resource. Handles are
/// move-only: exactly one live handle exists per allocated slot. Dropping a
/// valid handle never frees the slot synchronously; it is retired with the
/// current submission number and returned to its allocator once the GPU
/// completion counter reaches that number.
///
/// `DescriptorHandle::default()` is the invalid handle, which is also what
/// `std::mem::take` leaves behind.
#[derive(Default)]
pub struct DescriptorHandle {
    class: ResourceClass,
    slot: u32,
    retire: Option<Arc<RetireList<DescriptorSlot>>>,
}

impl DescriptorHandle {
    pub(crate) fn new(
        class: ResourceClass,
        slot: u32,
        retire: Arc<RetireList<DescriptorSlot>>,
    ) -> Self {
        Self {
            class,
            slot,
            retire: Some(retire),
        }
    }

    pub fn class(&self) -> ResourceClass {
        self.class
    }

    /// Bindless index of the descriptor (meaningless for invalid handles)
    pub fn index(&self) -> u32 {
        self.slot
    }

    pub fn is_valid(&self) -> bool {
        self.class.is_valid() && self.retire.is_some()
    }

    /// Retire the slot now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for DescriptorHandle {
    fn drop(&mut self) {
        if !self.class.is_valid() {
            return;
        }
        if let Some(retire) = self.retire.take() {
            retire.retire(DescriptorSlot {
                class: self.class,
                slot: self.slot,
            });
        }
        self.class = ResourceClass::Invalid;
    }
}

impl fmt::Debug for DescriptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorHandle")
            .field("class", &self.class)
            .field("index", &self.slot)
            .finish()
    }
}

#[cfg(test)]
#[path = "descriptor_handle_tests.rs"]
mod tests;
