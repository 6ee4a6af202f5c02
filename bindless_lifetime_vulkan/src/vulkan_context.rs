/// GpuContext - Shared GPU objects for the Vulkan backend
///
/// Contains everything the backend's sub-objects need:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Graphics queue (the single queue every submission goes to)

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

/// Shared GPU context.
///
/// Shared (via `Arc`) between the backend and the sampler cache.
///
/// Note: Device and instance destruction is handled by `VulkanBackend::drop()`
/// so the allocator can be released between the two.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// Vulkan instance (destroyed by VulkanBackend)
    pub instance: ash::Instance,

    /// Physical device the logical device was created from
    pub physical_device: vk::PhysicalDevice,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop to ensure it's dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Debug utils loader (for validation layers)
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: ash::Device,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        Self {
            device,
            instance,
            physical_device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family,
            debug_utils_loader,
            debug_messenger,
        }
    }
}
