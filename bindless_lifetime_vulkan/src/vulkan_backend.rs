/// VulkanBackend - Vulkan implementation of the Backend trait
///
/// Owns the instance, the logical device, the single graphics queue, the
/// timeline semaphore, the bindless descriptor set, the immediate
/// submission channel and the per-frame command pools.

use ash::vk;
use bindless_lifetime::bindless::{
    Backend, BufferDesc, BufferUsage, Config, DescriptorWrite, Error, ImageDesc, MemoryLocation,
    ResourceClass, Result, TableConfig,
};
use bindless_lifetime::{gpu_debug, gpu_err, gpu_error, gpu_info, gpu_warn};
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{CStr, CString};
use std::mem::ManuallyDrop;
use std::sync::Arc;

use crate::debug::raise_pending_error;
use crate::vulkan_buffer::{check_write_range, VulkanBuffer};
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_table::BindlessDescriptorSet;
use crate::vulkan_format::image_layout_to_vk;
use crate::vulkan_frame::FrameRing;
use crate::vulkan_image::VulkanImage;
use crate::vulkan_immediate::ImmediateChannel;
use crate::vulkan_sampler::{SamplerCache, SamplerType};
use crate::vulkan_timeline::TimelineSemaphore;

/// Vulkan backend
///
/// Every submission goes to one graphics queue and signals one timeline
/// semaphore, so a single completion counter covers every deletion queue.
pub struct VulkanBackend {
    /// Vulkan library loader (must outlive the instance)
    _entry: ash::Entry,
    /// Shared device, instance, allocator and queue
    ctx: Arc<GpuContext>,
    timeline: TimelineSemaphore,
    descriptors: BindlessDescriptorSet,
    immediate: ImmediateChannel,
    frames: FrameRing,
    /// Capacities `descriptors` was created with
    table: TableConfig,
    sampler_cache: SamplerCache,
}

fn init_failed(what: &str, e: impl std::fmt::Debug) -> Error {
    gpu_error!("bindless::vulkan", "{}: {:?}", what, e);
    Error::InitializationFailed(format!("{}: {:?}", what, e))
}

/// Descriptor indexing, timeline semaphore and synchronization2 support
fn supports_bindless(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };
    if properties.api_version < vk::API_VERSION_1_3 {
        return false;
    }

    let mut features12 = vk::PhysicalDeviceVulkan12Features::default();
    let mut features13 = vk::PhysicalDeviceVulkan13Features::default();
    let mut features2 = vk::PhysicalDeviceFeatures2::default()
        .push_next(&mut features12)
        .push_next(&mut features13);
    unsafe { instance.get_physical_device_features2(physical_device, &mut features2) };
    let anisotropy = features2.features.sampler_anisotropy == vk::TRUE;

    let required12 = [
        features12.descriptor_indexing,
        features12.runtime_descriptor_array,
        features12.descriptor_binding_partially_bound,
        features12.descriptor_binding_update_unused_while_pending,
        features12.descriptor_binding_storage_buffer_update_after_bind,
        features12.descriptor_binding_sampled_image_update_after_bind,
        features12.descriptor_binding_storage_image_update_after_bind,
        features12.shader_storage_buffer_array_non_uniform_indexing,
        features12.shader_sampled_image_array_non_uniform_indexing,
        features12.shader_storage_image_array_non_uniform_indexing,
        features12.timeline_semaphore,
    ];
    let required13 = [features13.synchronization2, features13.dynamic_rendering];

    anisotropy
        && required12.iter().all(|&f| f == vk::TRUE)
        && required13.iter().all(|&f| f == vk::TRUE)
}

impl VulkanBackend {
    /// Bring up Vulkan for `window` and build every bindless object
    ///
    /// The window is only used to pick a graphics queue that can also
    /// present to it.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        config.validate()?;
        let enable_validation = cfg!(feature = "vulkan-validation") && config.enable_validation;

        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| init_failed("Failed to load Vulkan library", e))?;

            // Application Info
            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"bindless_lifetime")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            // Get required extensions
            let display_handle = window.display_handle()
                .map_err(|e| init_failed("Failed to get display handle", e))?;
            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_failed("Failed to get required extensions", e))?
                .to_vec();

            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| init_failed("Failed to create Vulkan instance", e))?;

            // Setup debug messenger if validation is enabled
            let (debug_utils_loader, debug_messenger) = if enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);

                crate::debug::init_debug_config(crate::debug::Config {
                    severity: config.debug_severity,
                    message_filter: config.debug_message_filter,
                    panic_on_error: config.panic_on_error,
                    enable_stats: config.enable_validation_stats,
                });

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => (Some(debug_utils), Some(messenger)),
                    Err(e) => {
                        crate::debug::cleanup_debug_config();
                        instance.destroy_instance(None);
                        return Err(init_failed("Failed to create debug messenger", e));
                    }
                }
            } else {
                (None, None)
            };

            let destroy_instance = |instance: &ash::Instance| {
                crate::debug::cleanup_debug_config();
                if let (Some(loader), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                    loader.destroy_debug_utils_messenger(messenger, None);
                }
                instance.destroy_instance(None);
            };

            // Create Surface (temporary for queue selection)
            let window_handle = match window.window_handle() {
                Ok(handle) => handle,
                Err(e) => {
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to get window handle", e));
                }
            };
            let surface = match ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => surface,
                Err(e) => {
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to create surface", e));
                }
            };
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            // Pick the first device with bindless support and a graphics+present queue
            let physical_devices = match instance.enumerate_physical_devices() {
                Ok(devices) => devices,
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to enumerate physical devices", e));
                }
            };

            let selected = physical_devices.into_iter().find_map(|physical_device| {
                if !supports_bindless(&instance, physical_device) {
                    return None;
                }
                instance
                    .get_physical_device_queue_family_properties(physical_device)
                    .iter()
                    .enumerate()
                    .find(|(i, qf)| {
                        qf.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                            && surface_loader
                                .get_physical_device_surface_support(physical_device, *i as u32, surface)
                                .unwrap_or(false)
                    })
                    .map(|(i, _)| (physical_device, i as u32))
            });

            // Destroy temporary surface
            surface_loader.destroy_surface(surface, None);

            let (physical_device, graphics_family_index) = match selected {
                Some(selected) => selected,
                None => {
                    destroy_instance(&instance);
                    gpu_error!("bindless::vulkan", "No Vulkan 1.3 GPU with descriptor indexing and timeline semaphores found");
                    return Err(Error::InitializationFailed(
                        "No Vulkan 1.3 GPU with descriptor indexing and timeline semaphores found".to_string(),
                    ));
                }
            };

            let device_name = CStr::from_ptr(
                instance.get_physical_device_properties(physical_device).device_name.as_ptr(),
            )
            .to_string_lossy()
            .into_owned();

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

            let mut features12 = vk::PhysicalDeviceVulkan12Features::default()
                .descriptor_indexing(true)
                .runtime_descriptor_array(true)
                .descriptor_binding_partially_bound(true)
                .descriptor_binding_update_unused_while_pending(true)
                .descriptor_binding_storage_buffer_update_after_bind(true)
                .descriptor_binding_sampled_image_update_after_bind(true)
                .descriptor_binding_storage_image_update_after_bind(true)
                .shader_storage_buffer_array_non_uniform_indexing(true)
                .shader_sampled_image_array_non_uniform_indexing(true)
                .shader_storage_image_array_non_uniform_indexing(true)
                .timeline_semaphore(true);
            let mut features13 = vk::PhysicalDeviceVulkan13Features::default()
                .synchronization2(true)
                .dynamic_rendering(true);
            let mut features2 = vk::PhysicalDeviceFeatures2::default()
                .features(vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true))
                .push_next(&mut features12)
                .push_next(&mut features13);

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .push_next(&mut features2);

            let device = match instance.create_device(physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to create logical device", e));
                }
            };

            let graphics_queue = device.get_device_queue(graphics_family_index, 0);

            // Create GPU allocator
            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    destroy_instance(&instance);
                    return Err(init_failed("Failed to create GPU allocator", e));
                }
            };

            // From here on, a failure drops `backend` and its Drop tears everything down
            let ctx = Arc::new(GpuContext::new(
                device,
                instance,
                physical_device,
                allocator,
                graphics_queue,
                graphics_family_index,
                debug_utils_loader,
                debug_messenger,
            ));

            let mut backend = Self {
                _entry: entry,
                sampler_cache: SamplerCache::new(Arc::clone(&ctx)),
                ctx,
                timeline: TimelineSemaphore::empty(),
                descriptors: BindlessDescriptorSet::empty(),
                immediate: ImmediateChannel::empty(),
                frames: FrameRing::empty(),
                table: config.table,
            };

            backend.timeline = TimelineSemaphore::new(&backend.ctx.device)?;
            backend.descriptors = BindlessDescriptorSet::new(&backend.ctx.device, &config.table)?;
            backend.immediate = ImmediateChannel::new(&backend.ctx.device, graphics_family_index)?;
            backend.frames = FrameRing::new(&backend.ctx.device, graphics_family_index, config.frames_in_flight)?;

            gpu_info!(
                "bindless::vulkan",
                "Vulkan backend ready on '{}' (queue family {}, {} frames in flight, validation {})",
                device_name,
                graphics_family_index,
                config.frames_in_flight,
                if enable_validation { "on" } else { "off" }
            );

            Ok(backend)
        }
    }

    pub fn device(&self) -> &ash::Device {
        &self.ctx.device
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.ctx.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.ctx.physical_device
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.ctx.graphics_queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.ctx.graphics_queue_family
    }

    /// The global bindless descriptor set
    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptors.set()
    }

    pub fn descriptor_set_layout(&self) -> vk::DescriptorSetLayout {
        self.descriptors.layout()
    }

    /// Pipeline layout with the bindless set at index 0 and
    /// [`crate::PUSH_CONSTANT_SIZE`] bytes of push constants
    pub fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.descriptors.pipeline_layout()
    }

    /// Bind the bindless set at index 0 for `bind_point`
    pub fn bind_descriptor_set(&self, cmd: vk::CommandBuffer, bind_point: vk::PipelineBindPoint) {
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                cmd,
                bind_point,
                self.descriptors.pipeline_layout(),
                0,
                &[self.descriptors.set()],
                &[],
            );
        }
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.frames.len() as u32
    }

    /// Cached sampler of the given type (created on first use)
    pub fn sampler(&mut self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        self.sampler_cache.get(sampler_type)
    }

    pub fn cached_sampler_count(&self) -> usize {
        self.sampler_cache.len()
    }
}

impl Backend for VulkanBackend {
    type Buffer = VulkanBuffer;
    type Image = VulkanImage;
    type ImageView = vk::ImageView;
    type Sampler = vk::Sampler;
    type CommandBuffer = vk::CommandBuffer;

    fn table_config(&self) -> TableConfig {
        self.table
    }

    fn frames_in_flight(&self) -> u32 {
        self.frames.len() as u32
    }

    fn image_view(image: &VulkanImage) -> &vk::ImageView {
        image.view()
    }

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<VulkanBuffer> {
        VulkanBuffer::new(&self.ctx, desc)
    }

    fn create_image(&mut self, desc: &ImageDesc) -> Result<VulkanImage> {
        VulkanImage::new(&self.ctx, desc)
    }

    fn write_buffer(&self, buffer: &VulkanBuffer, offset: u64, data: &[u8]) -> Result<()> {
        buffer.write(offset, data)
    }

    fn upload_buffer(&mut self, buffer: &VulkanBuffer, offset: u64, data: &[u8]) -> Result<()> {
        check_write_range(buffer.size(), offset, data.len())?;
        if data.is_empty() {
            return Ok(());
        }

        let mut staging = VulkanBuffer::new(
            &self.ctx,
            &BufferDesc {
                size: data.len() as u64,
                usage: BufferUsage::TRANSFER_SRC,
                location: MemoryLocation::CpuToGpu,
                name: "staging".to_string(),
            },
        )?;

        let device = &self.ctx.device;
        let result = staging.write(0, data).and_then(|()| {
            let region = vk::BufferCopy::default()
                .src_offset(0)
                .dst_offset(offset)
                .size(data.len() as u64);
            self.immediate.submit(device, self.ctx.graphics_queue, |cmd| unsafe {
                device.cmd_copy_buffer(*cmd, staging.handle(), buffer.handle(), &[region]);
            })
        });

        // The queue is idle once the immediate submission returns
        staging.destroy(&self.ctx);
        raise_pending_error();
        gpu_debug!("bindless::vulkan", "Uploaded {} bytes at offset {}", data.len(), offset);
        result
    }

    fn destroy_buffer(&mut self, mut buffer: VulkanBuffer) {
        buffer.destroy(&self.ctx);
    }

    fn destroy_image(&mut self, mut image: VulkanImage) {
        image.destroy(&self.ctx);
    }

    fn write_descriptor(&mut self, slot: u32, write: DescriptorWrite<'_, Self>) -> Result<()> {
        let class = write.class();
        let device = &self.ctx.device;
        let result = match write {
            DescriptorWrite::StorageBuffer(buffer) => {
                self.descriptors.write_buffer(device, class, slot, buffer.handle())
            }
            DescriptorWrite::CombinedImageSampler { sampler, view, layout } => {
                let info = vk::DescriptorImageInfo::default()
                    .sampler(*sampler)
                    .image_view(*view)
                    .image_layout(image_layout_to_vk(layout));
                self.descriptors.write_image(device, class, slot, info)
            }
            DescriptorWrite::StorageImage { view, layout }
            | DescriptorWrite::SampledImage { view, layout } => {
                let info = vk::DescriptorImageInfo::default()
                    .image_view(*view)
                    .image_layout(image_layout_to_vk(layout));
                self.descriptors.write_image(device, class, slot, info)
            }
            DescriptorWrite::Sampler(sampler) => {
                let info = vk::DescriptorImageInfo::default().sampler(*sampler);
                self.descriptors.write_image(device, ResourceClass::Sampler, slot, info)
            }
        };
        raise_pending_error();
        result
    }

    fn completed_value(&self) -> Result<u64> {
        self.timeline.value(&self.ctx.device)
    }

    fn wait_for_value(&self, value: u64) -> Result<()> {
        self.timeline.wait(&self.ctx.device, value)
    }

    fn begin_frame_commands(&mut self, frame_slot: u32) -> Result<vk::CommandBuffer> {
        self.frames.begin(&self.ctx.device, frame_slot)
    }

    fn submit_frame(&mut self, frame_slot: u32, command_buffer: &vk::CommandBuffer, signal_value: u64) -> Result<()> {
        let result = self.frames.submit(
            &self.ctx.device,
            self.ctx.graphics_queue,
            frame_slot,
            *command_buffer,
            self.timeline.handle(),
            signal_value,
        );
        raise_pending_error();
        result
    }

    fn immediate_submit<F: FnOnce(&vk::CommandBuffer)>(&mut self, record: F) -> Result<()> {
        let result = self.immediate.submit(&self.ctx.device, self.ctx.graphics_queue, record);
        raise_pending_error();
        result
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.ctx.device
                .device_wait_idle()
                .map_err(|e| gpu_err!("bindless::vulkan", "Failed to wait idle: {:?}", e))
        }
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.ctx.device.device_wait_idle().ok();

            // 1. Shutdown sampler cache: destroy VkSamplers and release its Arc<GpuContext>.
            //    After this, self.ctx is the sole Arc<GpuContext> owner.
            self.sampler_cache.shutdown();

            // 2. Destroy backend-owned Vulkan objects
            let device = &self.ctx.device;
            self.frames.destroy(device);
            self.immediate.destroy(device);
            self.descriptors.destroy(device);
            self.timeline.destroy(device);

            // 3. Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            match Arc::get_mut(&mut self.ctx) {
                Some(ctx) => ManuallyDrop::drop(&mut ctx.allocator),
                None => gpu_warn!("bindless::vulkan", "GPU context still shared at shutdown, allocator leaked"),
            }

            // 4. Cleanup debug config to prevent callbacks during destruction
            crate::debug::cleanup_debug_config();

            // 5. Destroy debug messenger BEFORE device and instance
            if let (Some(debug_utils), Some(messenger)) = (
                &self.ctx.debug_utils_loader,
                &self.ctx.debug_messenger,
            ) {
                debug_utils.destroy_debug_utils_messenger(*messenger, None);
            }

            // 6. Destroy device and instance
            self.ctx.device.destroy_device(None);
            self.ctx.instance.destroy_instance(None);
        }
    }
}
