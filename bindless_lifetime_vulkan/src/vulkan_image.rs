/// VulkanImage - native image, its default view and its memory allocation

use ash::vk;
use bindless_lifetime::bindless::{Error, ImageDesc, Result};
use bindless_lifetime::{gpu_err, gpu_error};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_mask, format_to_vk, image_usage_to_vk};

/// Vulkan image with a default 2D view covering every mip level
pub struct VulkanImage {
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) allocation: Option<Allocation>,
    pub(crate) format: vk::Format,
    pub(crate) extent: vk::Extent2D,
}

impl VulkanImage {
    pub(crate) fn new(ctx: &GpuContext, desc: &ImageDesc) -> Result<Self> {
        unsafe {
            let format = format_to_vk(desc.format);
            let mip_levels = desc.mip_levels.max(1);

            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width: desc.width,
                    height: desc.height,
                    depth: 1,
                })
                .mip_levels(mip_levels)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(image_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = ctx.device.create_image(&image_create_info, None)
                .map_err(|e| gpu_err!("bindless::vulkan", "Failed to create image '{}': {:?}", desc.name, e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);

            let allocation = match ctx.allocator.lock() {
                Ok(mut allocator) => allocator.allocate(&AllocationCreateDesc {
                    name: &desc.name,
                    requirements,
                    location: gpu_allocator::MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                }),
                Err(_) => {
                    ctx.device.destroy_image(image, None);
                    return Err(gpu_err!("bindless::vulkan", "GPU allocator lock poisoned"));
                }
            };

            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_e) => {
                    ctx.device.destroy_image(image, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    gpu_error!(
                        "bindless::vulkan",
                        "Out of GPU memory for image '{}' (size: {}x{}, {:.2} MB)",
                        desc.name, desc.width, desc.height, size_mb
                    );
                    return Err(Error::OutOfMemory);
                }
            };

            let mut created = Self {
                image,
                view: vk::ImageView::null(),
                allocation: Some(allocation),
                format,
                extent: vk::Extent2D {
                    width: desc.width,
                    height: desc.height,
                },
            };

            let (memory, offset) = match created.allocation.as_ref() {
                Some(allocation) => (allocation.memory(), allocation.offset()),
                None => (vk::DeviceMemory::null(), 0),
            };
            if let Err(e) = ctx.device.bind_image_memory(image, memory, offset) {
                created.destroy(ctx);
                return Err(gpu_err!("bindless::vulkan", "Failed to bind image memory: {:?}", e));
            }

            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect_mask(desc.format),
                    base_mip_level: 0,
                    level_count: mip_levels,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            match ctx.device.create_image_view(&view_create_info, None) {
                Ok(view) => created.view = view,
                Err(e) => {
                    created.destroy(ctx);
                    return Err(gpu_err!("bindless::vulkan", "Failed to create image view: {:?}", e));
                }
            }

            Ok(created)
        }
    }

    pub fn handle(&self) -> vk::Image {
        self.image
    }

    pub fn view(&self) -> &vk::ImageView {
        &self.view
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Destroy the view, free the memory, then destroy the image
    pub(crate) fn destroy(&mut self, ctx: &GpuContext) {
        unsafe {
            if self.view != vk::ImageView::null() {
                ctx.device.destroy_image_view(self.view, None);
                self.view = vk::ImageView::null();
            }

            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            ctx.device.destroy_image(self.image, None);
            self.image = vk::Image::null();
        }
    }
}
