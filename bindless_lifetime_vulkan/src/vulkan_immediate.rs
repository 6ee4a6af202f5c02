/// ImmediateChannel - synchronous one-shot submissions
///
/// A single reusable command buffer: reset, record, submit without a
/// fence, then wait for the queue to drain.

use ash::vk;
use bindless_lifetime::bindless::{Error, Result};
use bindless_lifetime::{gpu_err, gpu_error};

pub(crate) struct ImmediateChannel {
    pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
}

impl ImmediateChannel {
    pub(crate) fn empty() -> Self {
        Self {
            pool: vk::CommandPool::null(),
            command_buffer: vk::CommandBuffer::null(),
        }
    }

    pub(crate) fn new(device: &ash::Device, queue_family: u32) -> Result<Self> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.create_command_pool(&pool_info, None) }
            .map_err(|e| {
                gpu_error!("bindless::vulkan", "Failed to create immediate command pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create immediate command pool: {:?}", e))
            })?;

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = match unsafe { device.allocate_command_buffers(&alloc_info) } {
            Ok(buffers) => buffers[0],
            Err(e) => {
                unsafe { device.destroy_command_pool(pool, None) };
                gpu_error!("bindless::vulkan", "Failed to allocate immediate command buffer: {:?}", e);
                return Err(Error::InitializationFailed(format!(
                    "Failed to allocate immediate command buffer: {:?}",
                    e
                )));
            }
        };

        Ok(Self { pool, command_buffer })
    }

    /// Record with `record`, submit to `queue` and block until it is idle
    pub(crate) fn submit<F: FnOnce(&vk::CommandBuffer)>(
        &self,
        device: &ash::Device,
        queue: vk::Queue,
        record: F,
    ) -> Result<()> {
        let cmd = self.command_buffer;
        unsafe {
            device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .map_err(|e| gpu_err!("bindless::vulkan", "immediate_submit: failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(cmd, &begin_info)
                .map_err(|e| gpu_err!("bindless::vulkan", "immediate_submit: failed to begin command buffer: {:?}", e))?;

            record(&cmd);

            device
                .end_command_buffer(cmd)
                .map_err(|e| gpu_err!("bindless::vulkan", "immediate_submit: failed to end command buffer: {:?}", e))?;

            let cmd_infos = [vk::CommandBufferSubmitInfo::default().command_buffer(cmd)];
            let submit_info = vk::SubmitInfo2::default().command_buffer_infos(&cmd_infos);

            device
                .queue_submit2(queue, &[submit_info], vk::Fence::null())
                .map_err(|e| gpu_err!("bindless::vulkan", "immediate_submit: vkQueueSubmit2 failed: {:?}", e))?;

            device
                .queue_wait_idle(queue)
                .map_err(|e| gpu_err!("bindless::vulkan", "immediate_submit: vkQueueWaitIdle failed: {:?}", e))
        }
    }

    pub(crate) fn destroy(&mut self, device: &ash::Device) {
        if self.pool != vk::CommandPool::null() {
            // Destroying the pool frees its command buffer
            unsafe { device.destroy_command_pool(self.pool, None) };
            self.pool = vk::CommandPool::null();
            self.command_buffer = vk::CommandBuffer::null();
        }
    }
}
