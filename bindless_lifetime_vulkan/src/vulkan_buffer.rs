/// VulkanBuffer - native buffer plus its memory allocation

use ash::vk;
use bindless_lifetime::bindless::{BufferDesc, Error, MemoryLocation, Result};
use bindless_lifetime::{gpu_err, gpu_error};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{buffer_usage_to_vk, memory_location_to_vk};

/// Vulkan buffer
///
/// Holds no reference to the device: destruction goes through
/// [`VulkanBuffer::destroy`], called by the backend once the GPU is done.
pub struct VulkanBuffer {
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Buffer size
    pub(crate) size: u64,
    pub(crate) location: MemoryLocation,
}

impl VulkanBuffer {
    /// Create a buffer and bind freshly allocated memory to it
    pub(crate) fn new(ctx: &GpuContext, desc: &BufferDesc) -> Result<Self> {
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.usage) | vk::BufferUsageFlags::TRANSFER_DST)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx.device.create_buffer(&buffer_create_info, None)
                .map_err(|e| gpu_err!("bindless::vulkan", "Failed to create buffer '{}' of size {} bytes: {:?}", desc.name, desc.size, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);

            let allocation = {
                let mut allocator = match ctx.allocator.lock() {
                    Ok(allocator) => allocator,
                    Err(_) => {
                        ctx.device.destroy_buffer(buffer, None);
                        return Err(gpu_err!("bindless::vulkan", "GPU allocator lock poisoned"));
                    }
                };
                allocator.allocate(&AllocationCreateDesc {
                    name: &desc.name,
                    requirements,
                    location: memory_location_to_vk(desc.location),
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
            };

            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    gpu_error!("bindless::vulkan", "Out of GPU memory for buffer '{}' (required: {:.2} MB)", desc.name, size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            let mut created = Self {
                buffer,
                allocation: Some(allocation),
                size: desc.size,
                location: desc.location,
            };

            if let Err(e) = ctx.device.bind_buffer_memory(buffer, created.memory(), created.memory_offset()) {
                created.destroy(ctx);
                return Err(gpu_err!("bindless::vulkan", "Failed to bind buffer memory: {:?}", e));
            }

            Ok(created)
        }
    }

    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn location(&self) -> MemoryLocation {
        self.location
    }

    fn memory(&self) -> vk::DeviceMemory {
        self.allocation
            .as_ref()
            .map(|allocation| unsafe { allocation.memory() })
            .unwrap_or_default()
    }

    fn memory_offset(&self) -> u64 {
        self.allocation.as_ref().map(Allocation::offset).unwrap_or(0)
    }

    /// Copy `data` into host-visible memory at `offset`
    pub(crate) fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        check_write_range(self.size, offset, data.len())?;

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            gpu_error!("bindless::vulkan", "Buffer write failed: no GPU allocation");
            Error::InvalidResource("buffer has no allocation".to_string())
        })?;

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::InvalidResource("buffer is not CPU-accessible".to_string()))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                // In range: checked against `self.size` above
                mapped_ptr.add(offset as usize),
                data.len(),
            );
        }

        Ok(())
    }

    /// Free the memory and destroy the buffer
    pub(crate) fn destroy(&mut self, ctx: &GpuContext) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                // Don't bail if the lock is poisoned - the buffer must still go
                if let Ok(mut allocator) = ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            ctx.device.destroy_buffer(self.buffer, None);
            self.buffer = vk::Buffer::null();
        }
    }
}

/// Reject a write of `len` bytes at `offset` that does not fit in `size` bytes
pub(crate) fn check_write_range(size: u64, offset: u64, len: usize) -> Result<()> {
    match offset.checked_add(len as u64) {
        Some(end) if end <= size => Ok(()),
        _ => {
            gpu_error!(
                "bindless::vulkan",
                "Buffer write of {} bytes at offset {} exceeds buffer size {}",
                len,
                offset,
                size
            );
            Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} exceeds buffer size {}",
                len, offset, size
            )))
        }
    }
}

#[cfg(test)]
#[path = "vulkan_buffer_tests.rs"]
mod tests;
