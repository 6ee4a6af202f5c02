/// FrameRing - one command pool and primary command buffer per frame in flight

use ash::vk;
use bindless_lifetime::bindless::{Error, Result};
use bindless_lifetime::{gpu_err, gpu_error};

struct FrameCommands {
    pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
}

pub(crate) struct FrameRing {
    frames: Vec<FrameCommands>,
}

impl FrameRing {
    pub(crate) fn empty() -> Self {
        Self { frames: Vec::new() }
    }

    pub(crate) fn new(device: &ash::Device, queue_family: u32, frames_in_flight: u32) -> Result<Self> {
        let mut ring = Self {
            frames: Vec::with_capacity(frames_in_flight as usize),
        };

        for index in 0..frames_in_flight {
            match Self::create_frame(device, queue_family) {
                Ok(frame) => ring.frames.push(frame),
                Err(e) => {
                    ring.destroy(device);
                    gpu_error!("bindless::vulkan", "Failed to create command pool for frame {}: {:?}", index, e);
                    return Err(Error::InitializationFailed(format!(
                        "Failed to create command pool for frame {}: {:?}",
                        index, e
                    )));
                }
            }
        }

        Ok(ring)
    }

    fn create_frame(device: &ash::Device, queue_family: u32) -> std::result::Result<FrameCommands, vk::Result> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default().queue_family_index(queue_family);
            let pool = device.create_command_pool(&pool_info, None)?;

            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            match device.allocate_command_buffers(&alloc_info) {
                Ok(buffers) => Ok(FrameCommands {
                    pool,
                    command_buffer: buffers[0],
                }),
                Err(e) => {
                    device.destroy_command_pool(pool, None);
                    Err(e)
                }
            }
        }
    }

    fn frame(&self, slot: u32) -> Result<&FrameCommands> {
        self.frames.get(slot as usize).ok_or_else(|| {
            Error::InvalidResource(format!(
                "frame slot {} out of range ({} frames in flight)",
                slot,
                self.frames.len()
            ))
        })
    }

    /// Reset the slot's pool and begin its command buffer.
    /// The caller must have waited for the slot's previous submission.
    pub(crate) fn begin(&self, device: &ash::Device, slot: u32) -> Result<vk::CommandBuffer> {
        let frame = self.frame(slot)?;
        unsafe {
            device
                .reset_command_pool(frame.pool, vk::CommandPoolResetFlags::empty())
                .map_err(|e| gpu_err!("bindless::vulkan", "Failed to reset command pool of frame {}: {:?}", slot, e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            device
                .begin_command_buffer(frame.command_buffer, &begin_info)
                .map_err(|e| gpu_err!("bindless::vulkan", "Failed to begin command buffer of frame {}: {:?}", slot, e))?;
        }
        Ok(frame.command_buffer)
    }

    /// End `cmd` and submit it, signalling `timeline` to `signal_value` once done
    pub(crate) fn submit(
        &self,
        device: &ash::Device,
        queue: vk::Queue,
        slot: u32,
        cmd: vk::CommandBuffer,
        timeline: vk::Semaphore,
        signal_value: u64,
    ) -> Result<()> {
        let frame = self.frame(slot)?;
        if frame.command_buffer != cmd {
            gpu_error!("bindless::vulkan", "submit_frame: command buffer does not belong to frame {}", slot);
            return Err(Error::InvalidResource(format!(
                "command buffer does not belong to frame {}",
                slot
            )));
        }

        unsafe {
            device
                .end_command_buffer(cmd)
                .map_err(|e| gpu_err!("bindless::vulkan", "Failed to end command buffer of frame {}: {:?}", slot, e))?;

            let cmd_infos = [vk::CommandBufferSubmitInfo::default().command_buffer(cmd)];
            let signal_infos = [vk::SemaphoreSubmitInfo::default()
                .semaphore(timeline)
                .value(signal_value)
                .stage_mask(vk::PipelineStageFlags2::ALL_COMMANDS)];
            let submit_info = vk::SubmitInfo2::default()
                .command_buffer_infos(&cmd_infos)
                .signal_semaphore_infos(&signal_infos);

            device
                .queue_submit2(queue, &[submit_info], vk::Fence::null())
                .map_err(|e| gpu_err!("bindless::vulkan", "vkQueueSubmit2 failed for frame {} (signal {}): {:?}", slot, signal_value, e))
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn destroy(&mut self, device: &ash::Device) {
        for frame in self.frames.drain(..) {
            unsafe { device.destroy_command_pool(frame.pool, None) };
        }
    }
}
