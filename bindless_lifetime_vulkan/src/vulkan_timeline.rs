/// TimelineSemaphore - the GPU completion counter
///
/// Every queue submission signals the next value of this semaphore. The
/// value read back is the highest submission the GPU has finished.

use ash::vk;
use bindless_lifetime::bindless::{Error, Result};
use bindless_lifetime::{gpu_err, gpu_error};

pub(crate) struct TimelineSemaphore {
    semaphore: vk::Semaphore,
}

impl TimelineSemaphore {
    /// Placeholder holding no semaphore
    pub(crate) fn empty() -> Self {
        Self {
            semaphore: vk::Semaphore::null(),
        }
    }

    /// Create a timeline semaphore starting at 0
    pub(crate) fn new(device: &ash::Device) -> Result<Self> {
        let mut timeline_type_ci = vk::SemaphoreTypeCreateInfo::default()
            .semaphore_type(vk::SemaphoreType::TIMELINE)
            .initial_value(0);
        let create_info = vk::SemaphoreCreateInfo::default().push_next(&mut timeline_type_ci);

        let semaphore = unsafe { device.create_semaphore(&create_info, None) }
            .map_err(|e| {
                gpu_error!("bindless::vulkan", "Failed to create timeline semaphore: {:?}", e);
                Error::InitializationFailed(format!("Failed to create timeline semaphore: {:?}", e))
            })?;

        Ok(Self { semaphore })
    }

    pub(crate) fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }

    /// Current counter value
    pub(crate) fn value(&self, device: &ash::Device) -> Result<u64> {
        unsafe { device.get_semaphore_counter_value(self.semaphore) }
            .map_err(|e| gpu_err!("bindless::vulkan", "vkGetSemaphoreCounterValue failed: {:?}", e))
    }

    /// Block until the counter reaches `value`
    pub(crate) fn wait(&self, device: &ash::Device, value: u64) -> Result<()> {
        let semaphores = [self.semaphore];
        let values = [value];
        let wait_info = vk::SemaphoreWaitInfo::default()
            .semaphores(&semaphores)
            .values(&values);

        unsafe { device.wait_semaphores(&wait_info, u64::MAX) }
            .map_err(|e| gpu_err!("bindless::vulkan", "vkWaitSemaphores({}) failed: {:?}", value, e))
    }

    pub(crate) fn destroy(&mut self, device: &ash::Device) {
        if self.semaphore != vk::Semaphore::null() {
            unsafe { device.destroy_semaphore(self.semaphore, None) };
            self.semaphore = vk::Semaphore::null();
        }
    }
}
