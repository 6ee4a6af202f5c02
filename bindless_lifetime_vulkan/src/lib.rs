/*!
# Bindless Lifetime - Vulkan Backend

Vulkan implementation of the `bindless_lifetime` [`Backend`](bindless_lifetime::bindless::Backend)
trait, using Ash for Vulkan bindings and gpu-allocator for memory management.

Requires Vulkan 1.3 with descriptor indexing (update-after-bind, partially
bound, non-uniform indexing), timeline semaphores and synchronization2.
*/

mod debug;
mod vulkan_backend;
mod vulkan_buffer;
mod vulkan_context;
mod vulkan_descriptor_table;
mod vulkan_format;
mod vulkan_frame;
mod vulkan_image;
mod vulkan_immediate;
mod vulkan_sampler;
mod vulkan_timeline;

use bindless_lifetime::bindless::{Config, Device, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
pub use vulkan_backend::VulkanBackend;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_descriptor_table::PUSH_CONSTANT_SIZE;
pub use vulkan_image::VulkanImage;
pub use vulkan_sampler::SamplerType;

/// Bindless device driven by the Vulkan backend
pub type VulkanDevice = Device<VulkanBackend>;

/// Create a Vulkan backend for `window` and wrap it in a [`Device`]
///
/// # Example
///
/// ```no_run
/// use bindless_lifetime::bindless::Config;
/// # fn run(window: &winit::window::Window) -> bindless_lifetime::bindless::Result<()> {
/// let mut device = bindless_lifetime_vulkan::create_device(window, Config::default())?;
/// let frame = device.begin_frame()?;
/// let cmd = device.frame_commands()?;
/// device.submit_frame(&cmd)?;
/// # let _ = frame;
/// # Ok(())
/// # }
/// ```
pub fn create_device<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: Config) -> Result<VulkanDevice> {
    let backend = VulkanBackend::new(window, &config)?;
    Device::new(backend, config)
}
