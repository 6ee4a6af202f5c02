/// SamplerCache - VkSampler management for the Vulkan backend
///
/// Creates and caches VkSampler objects on first use. Sampler descriptors
/// point at these, so they live until the backend shuts down.

use crate::vulkan_context::GpuContext;
use ash::vk;
use bindless_lifetime::bindless::{Error, Result};
use bindless_lifetime::gpu_err;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Predefined sampler configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    /// Linear filtering, repeat addressing, 16x anisotropy
    LinearRepeat,
    /// Linear filtering, clamp to edge
    LinearClamp,
    NearestRepeat,
    NearestClamp,
    /// Depth comparison sampler (LESS_OR_EQUAL, white border)
    Shadow,
    Anisotropic,
}

/// Sampler cache - creates VkSampler on first use, destroys on shutdown/drop
pub(crate) struct SamplerCache {
    ctx: Option<Arc<GpuContext>>,
    cache: FxHashMap<SamplerType, vk::Sampler>,
}

impl SamplerCache {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx: Some(ctx),
            cache: FxHashMap::default(),
        }
    }

    /// Get or create a VkSampler for the given type
    pub(crate) fn get(&mut self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&sampler_type) {
            return Ok(sampler);
        }

        let ctx = self.ctx.as_ref().ok_or_else(|| {
            Error::InvalidResource("sampler cache used after shutdown".to_string())
        })?;
        let sampler = Self::create_vk_sampler(ctx, sampler_type)?;
        self.cache.insert(sampler_type, sampler);
        Ok(sampler)
    }

    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }

    /// Destroy all cached VkSamplers and release the GpuContext reference.
    /// Must be called during VulkanBackend::drop() while the device is still alive.
    pub(crate) fn shutdown(&mut self) {
        if let Some(ctx) = &self.ctx {
            for (_, sampler) in self.cache.drain() {
                unsafe { ctx.device.destroy_sampler(sampler, None); }
            }
        }
        self.ctx = None;
    }

    fn create_vk_sampler(ctx: &GpuContext, sampler_type: SamplerType) -> Result<vk::Sampler> {
        let (mag, min, mipmap, address, anisotropy, border, compare) = match sampler_type {
            SamplerType::LinearRepeat => (
                vk::Filter::LINEAR,
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::REPEAT,
                Some(16.0),
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::LinearClamp => (
                vk::Filter::LINEAR,
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
                Some(16.0),
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::NearestRepeat => (
                vk::Filter::NEAREST,
                vk::Filter::NEAREST,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::REPEAT,
                None,
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::NearestClamp => (
                vk::Filter::NEAREST,
                vk::Filter::NEAREST,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
                None,
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
            SamplerType::Shadow => (
                vk::Filter::LINEAR,
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::CLAMP_TO_BORDER,
                None,
                vk::BorderColor::FLOAT_OPAQUE_WHITE,
                true,
            ),
            SamplerType::Anisotropic => (
                vk::Filter::LINEAR,
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::REPEAT,
                Some(16.0),
                vk::BorderColor::FLOAT_OPAQUE_BLACK,
                false,
            ),
        };

        let mut create_info = vk::SamplerCreateInfo::default()
            .mag_filter(mag)
            .min_filter(min)
            .mipmap_mode(mipmap)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(border)
            .unnormalized_coordinates(false);

        if compare {
            create_info = create_info
                .compare_enable(true)
                .compare_op(vk::CompareOp::LESS_OR_EQUAL);
        } else {
            create_info = create_info
                .compare_enable(false)
                .compare_op(vk::CompareOp::ALWAYS);
        }

        if let Some(max_aniso) = anisotropy {
            create_info = create_info
                .anisotropy_enable(true)
                .max_anisotropy(max_aniso);
        } else {
            create_info = create_info
                .anisotropy_enable(false)
                .max_anisotropy(1.0);
        }

        unsafe {
            ctx.device.create_sampler(&create_info, None)
                .map_err(|e| gpu_err!("bindless::vulkan", "Failed to create {:?} sampler: {:?}", sampler_type, e))
        }
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        // Nothing left after shutdown()
        if let Some(ctx) = &self.ctx {
            for (_, sampler) in self.cache.drain() {
                unsafe { ctx.device.destroy_sampler(sampler, None); }
            }
        }
    }
}
