use crate::allocator::IndexAllocator;
use crate::config::TableConfig;
use crate::descriptor::{DescriptorSlot, ResourceClass};
use crate::error::{Error, Result};
use crate::gpu_error;

/// CPU-side bookkeeping of the bindless descriptor table.
///
/// Owns one [`IndexAllocator`] per class. The four resource classes share
/// `max_resource_descriptors` as capacity, samplers use
/// `max_sampler_descriptors`. The native descriptor writes themselves are
/// issued by the backend.
pub struct DescriptorTable {
    allocators: [IndexAllocator; 5],
}

impl DescriptorTable {
    pub fn new(config: &TableConfig) -> Self {
        let allocator = |class: ResourceClass| {
            let capacity = if class.is_sampler() {
                config.max_sampler_descriptors
            } else {
                config.max_resource_descriptors
            };
            IndexAllocator::new(class, capacity)
        };
        Self {
            allocators: ResourceClass::ALL.map(allocator),
        }
    }

    fn allocator(&self, class: ResourceClass) -> Result<&IndexAllocator> {
        class
            .binding()
            .map(|binding| &self.allocators[binding as usize])
            .ok_or_else(|| Error::InvalidResource("Invalid resource class has no descriptor slots".to_string()))
    }

    fn allocator_mut(&mut self, class: ResourceClass) -> Result<&mut IndexAllocator> {
        match class.binding() {
            Some(binding) => Ok(&mut self.allocators[binding as usize]),
            None => Err(Error::InvalidResource(
                "Invalid resource class has no descriptor slots".to_string(),
            )),
        }
    }

    /// Reserve a slot of `class`
    pub fn allocate(&mut self, class: ResourceClass) -> Result<u32> {
        self.allocator_mut(class)?.allocate().map_err(|e| {
            gpu_error!("bindless::DescriptorTable", "{}", e);
            e
        })
    }

    /// Return a slot of `class` to its allocator
    pub fn free(&mut self, class: ResourceClass, slot: u32) -> Result<()> {
        self.allocator_mut(class)?.free(slot)
    }

    /// Finalize a retired descriptor slot.
    ///
    /// A failure here means two handles owned the same slot; it is reported
    /// and asserted in debug builds.
    pub(crate) fn release(&mut self, retired: DescriptorSlot) {
        if let Err(e) = self.free(retired.class, retired.slot) {
            gpu_error!("bindless::DescriptorTable", "Reclaiming retired descriptor failed: {}", e);
            debug_assert!(false, "reclaiming retired descriptor failed: {}", e);
        }
    }

    pub fn capacity(&self, class: ResourceClass) -> u32 {
        self.allocator(class).map(IndexAllocator::capacity).unwrap_or(0)
    }

    /// Slots of `class` currently owned by live or retired-but-pending handles
    pub fn allocated(&self, class: ResourceClass) -> u32 {
        self.allocator(class).map(IndexAllocator::len).unwrap_or(0)
    }

    pub fn available(&self, class: ResourceClass) -> u32 {
        self.allocator(class).map(IndexAllocator::available).unwrap_or(0)
    }

    pub fn is_allocated(&self, class: ResourceClass, slot: u32) -> bool {
        self.allocator(class)
            .map(|a| a.is_allocated(slot))
            .unwrap_or(false)
    }
}

#[cfg(test)]
#[path = "descriptor_table_tests.rs"]
mod tests;
