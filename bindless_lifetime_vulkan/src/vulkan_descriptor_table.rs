/// BindlessDescriptorSet - the single global descriptor set
///
/// One pool, one layout with a binding per resource class, one set. Every
/// binding is an array sized by [`TableConfig`] and may be updated while
/// the set is bound and in use, as long as the updated slot itself is not.

use ash::vk;
use bindless_lifetime::bindless::{Error, ResourceClass, Result, TableConfig};
use bindless_lifetime::gpu_error;

/// Push-constant bytes every bindless pipeline layout exposes
pub const PUSH_CONSTANT_SIZE: u32 = 128;

pub(crate) struct BindlessDescriptorSet {
    pool: vk::DescriptorPool,
    layout: vk::DescriptorSetLayout,
    set: vk::DescriptorSet,
    pipeline_layout: vk::PipelineLayout,
}

/// Vulkan descriptor type backing a resource class
pub(crate) fn descriptor_type(class: ResourceClass) -> Option<vk::DescriptorType> {
    match class {
        ResourceClass::StorageBuffer => Some(vk::DescriptorType::STORAGE_BUFFER),
        ResourceClass::CombinedImageSampler => Some(vk::DescriptorType::COMBINED_IMAGE_SAMPLER),
        ResourceClass::StorageImage => Some(vk::DescriptorType::STORAGE_IMAGE),
        ResourceClass::SampledImage => Some(vk::DescriptorType::SAMPLED_IMAGE),
        ResourceClass::Sampler => Some(vk::DescriptorType::SAMPLER),
        ResourceClass::Invalid => None,
    }
}

fn class_capacity(class: ResourceClass, config: &TableConfig) -> u32 {
    if class.is_sampler() {
        config.max_sampler_descriptors
    } else {
        config.max_resource_descriptors
    }
}

fn init_error(what: &str, e: vk::Result) -> Error {
    gpu_error!("bindless::vulkan", "Failed to create bindless {}: {:?}", what, e);
    Error::InitializationFailed(format!("Failed to create bindless {}: {:?}", what, e))
}

impl BindlessDescriptorSet {
    pub(crate) fn empty() -> Self {
        Self {
            pool: vk::DescriptorPool::null(),
            layout: vk::DescriptorSetLayout::null(),
            set: vk::DescriptorSet::null(),
            pipeline_layout: vk::PipelineLayout::null(),
        }
    }

    pub(crate) fn new(device: &ash::Device, config: &TableConfig) -> Result<Self> {
        let pool_sizes: Vec<vk::DescriptorPoolSize> = ResourceClass::ALL
            .iter()
            .filter_map(|&class| {
                descriptor_type(class).map(|ty| {
                    vk::DescriptorPoolSize::default()
                        .ty(ty)
                        .descriptor_count(class_capacity(class, config))
                })
            })
            .collect();

        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::UPDATE_AFTER_BIND)
            .max_sets(1)
            .pool_sizes(&pool_sizes);

        let pool = unsafe { device.create_descriptor_pool(&pool_info, None) }
            .map_err(|e| init_error("descriptor pool", e))?;

        let mut bindings = Vec::with_capacity(ResourceClass::ALL.len());
        let mut binding_flags = Vec::with_capacity(ResourceClass::ALL.len());
        for &class in ResourceClass::ALL.iter() {
            if let (Some(binding), Some(ty)) = (class.binding(), descriptor_type(class)) {
                bindings.push(
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(binding)
                        .descriptor_type(ty)
                        .descriptor_count(class_capacity(class, config))
                        .stage_flags(vk::ShaderStageFlags::ALL),
                );
                binding_flags.push(
                    vk::DescriptorBindingFlags::UPDATE_AFTER_BIND
                        | vk::DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING
                        | vk::DescriptorBindingFlags::PARTIALLY_BOUND,
                );
            }
        }

        let mut binding_flags_info =
            vk::DescriptorSetLayoutBindingFlagsCreateInfo::default().binding_flags(&binding_flags);
        let layout_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(vk::DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL)
            .bindings(&bindings)
            .push_next(&mut binding_flags_info);

        let layout = match unsafe { device.create_descriptor_set_layout(&layout_info, None) } {
            Ok(layout) => layout,
            Err(e) => {
                unsafe { device.destroy_descriptor_pool(pool, None) };
                return Err(init_error("descriptor set layout", e));
            }
        };

        let mut created = Self {
            pool,
            layout,
            set: vk::DescriptorSet::null(),
            pipeline_layout: vk::PipelineLayout::null(),
        };

        let set_layouts = [layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(pool)
            .set_layouts(&set_layouts);

        match unsafe { device.allocate_descriptor_sets(&alloc_info) } {
            Ok(sets) => created.set = sets[0],
            Err(e) => {
                created.destroy(device);
                return Err(init_error("descriptor set", e));
            }
        }

        let push_constant_ranges = [vk::PushConstantRange::default()
            .stage_flags(vk::ShaderStageFlags::ALL)
            .offset(0)
            .size(PUSH_CONSTANT_SIZE)];
        let pipeline_layout_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        match unsafe { device.create_pipeline_layout(&pipeline_layout_info, None) } {
            Ok(pipeline_layout) => created.pipeline_layout = pipeline_layout,
            Err(e) => {
                created.destroy(device);
                return Err(init_error("pipeline layout", e));
            }
        }

        Ok(created)
    }

    pub(crate) fn set(&self) -> vk::DescriptorSet {
        self.set
    }

    pub(crate) fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    pub(crate) fn pipeline_layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    /// Write one buffer descriptor at `slot`, covering the whole buffer
    pub(crate) fn write_buffer(&self, device: &ash::Device, class: ResourceClass, slot: u32, buffer: vk::Buffer) -> Result<()> {
        let (binding, ty) = Self::binding_of(class)?;
        let buffer_info = [vk::DescriptorBufferInfo::default()
            .buffer(buffer)
            .offset(0)
            .range(vk::WHOLE_SIZE)];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.set)
            .dst_binding(binding)
            .dst_array_element(slot)
            .descriptor_type(ty)
            .buffer_info(&buffer_info);

        unsafe { device.update_descriptor_sets(&[write], &[]) };
        Ok(())
    }

    /// Write one image and/or sampler descriptor at `slot`
    pub(crate) fn write_image(&self, device: &ash::Device, class: ResourceClass, slot: u32, info: vk::DescriptorImageInfo) -> Result<()> {
        let (binding, ty) = Self::binding_of(class)?;
        let image_info = [info];
        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.set)
            .dst_binding(binding)
            .dst_array_element(slot)
            .descriptor_type(ty)
            .image_info(&image_info);

        unsafe { device.update_descriptor_sets(&[write], &[]) };
        Ok(())
    }

    fn binding_of(class: ResourceClass) -> Result<(u32, vk::DescriptorType)> {
        match (class.binding(), descriptor_type(class)) {
            (Some(binding), Some(ty)) => Ok((binding, ty)),
            _ => Err(Error::InvalidResource(format!("{} has no descriptor binding", class))),
        }
    }

    /// Destroy the pipeline layout, the set layout and the pool (which frees the set)
    pub(crate) fn destroy(&mut self, device: &ash::Device) {
        unsafe {
            if self.pipeline_layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.pipeline_layout, None);
                self.pipeline_layout = vk::PipelineLayout::null();
            }
            if self.layout != vk::DescriptorSetLayout::null() {
                device.destroy_descriptor_set_layout(self.layout, None);
                self.layout = vk::DescriptorSetLayout::null();
            }
            if self.pool != vk::DescriptorPool::null() {
                device.destroy_descriptor_pool(self.pool, None);
                self.pool = vk::DescriptorPool::null();
            }
            self.set = vk::DescriptorSet::null();
        }
    }
}
