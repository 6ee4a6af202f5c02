/// Conversions from backend-agnostic descriptions to Vulkan enums and flags

use ash::vk;
use bindless_lifetime::bindless::{BufferUsage, ImageFormat, ImageLayout, ImageUsage, MemoryLocation};

pub(crate) fn format_to_vk(format: ImageFormat) -> vk::Format {
    match format {
        ImageFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        ImageFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        ImageFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        ImageFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        ImageFormat::R16G16B16A16_SFLOAT => vk::Format::R16G16B16A16_SFLOAT,
        ImageFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        ImageFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        ImageFormat::R32_UINT => vk::Format::R32_UINT,
        ImageFormat::D16_UNORM => vk::Format::D16_UNORM,
        ImageFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
    }
}

/// Depth formats use the DEPTH aspect, everything else COLOR
pub(crate) fn aspect_mask(format: ImageFormat) -> vk::ImageAspectFlags {
    if format.is_depth() {
        vk::ImageAspectFlags::DEPTH
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

pub(crate) fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();
    if usage.contains(BufferUsage::STORAGE) {
        flags |= vk::BufferUsageFlags::STORAGE_BUFFER;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDIRECT) {
        flags |= vk::BufferUsageFlags::INDIRECT_BUFFER;
    }
    if usage.contains(BufferUsage::TRANSFER_SRC) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(BufferUsage::TRANSFER_DST) {
        flags |= vk::BufferUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn image_usage_to_vk(usage: ImageUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(ImageUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(ImageUsage::STORAGE) {
        flags |= vk::ImageUsageFlags::STORAGE;
    }
    if usage.contains(ImageUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(ImageUsage::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(ImageUsage::TRANSFER_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(ImageUsage::TRANSFER_DST) {
        flags |= vk::ImageUsageFlags::TRANSFER_DST;
    }
    flags
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::General => vk::ImageLayout::GENERAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        ImageLayout::ReadOnly => vk::ImageLayout::READ_ONLY_OPTIMAL,
    }
}

pub(crate) fn memory_location_to_vk(location: MemoryLocation) -> gpu_allocator::MemoryLocation {
    match location {
        MemoryLocation::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
        MemoryLocation::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
        MemoryLocation::GpuToCpu => gpu_allocator::MemoryLocation::GpuToCpu,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
