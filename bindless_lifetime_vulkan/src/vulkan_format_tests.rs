//! Unit tests for Vulkan conversion functions
//!
//! Pure mappings, no GPU required.

use super::*;

// ============================================================================
// IMAGE FORMAT CONVERSION TESTS
// ============================================================================

#[test]
fn test_format_to_vk_color_formats() {
    assert_eq!(format_to_vk(ImageFormat::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(ImageFormat::R8G8B8A8_SRGB), vk::Format::R8G8B8A8_SRGB);
    assert_eq!(format_to_vk(ImageFormat::B8G8R8A8_UNORM), vk::Format::B8G8R8A8_UNORM);
    assert_eq!(format_to_vk(ImageFormat::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
}

#[test]
fn test_format_to_vk_float_and_integer_formats() {
    assert_eq!(
        format_to_vk(ImageFormat::R16G16B16A16_SFLOAT),
        vk::Format::R16G16B16A16_SFLOAT
    );
    assert_eq!(
        format_to_vk(ImageFormat::R32G32B32A32_SFLOAT),
        vk::Format::R32G32B32A32_SFLOAT
    );
    assert_eq!(format_to_vk(ImageFormat::R32_SFLOAT), vk::Format::R32_SFLOAT);
    assert_eq!(format_to_vk(ImageFormat::R32_UINT), vk::Format::R32_UINT);
}

#[test]
fn test_format_to_vk_depth_formats() {
    assert_eq!(format_to_vk(ImageFormat::D16_UNORM), vk::Format::D16_UNORM);
    assert_eq!(format_to_vk(ImageFormat::D32_FLOAT), vk::Format::D32_SFLOAT);
}

#[test]
fn test_aspect_mask_depth_vs_color() {
    assert_eq!(aspect_mask(ImageFormat::D32_FLOAT), vk::ImageAspectFlags::DEPTH);
    assert_eq!(aspect_mask(ImageFormat::D16_UNORM), vk::ImageAspectFlags::DEPTH);
    assert_eq!(aspect_mask(ImageFormat::R8G8B8A8_UNORM), vk::ImageAspectFlags::COLOR);
}

// ============================================================================
// USAGE FLAG CONVERSION TESTS
// ============================================================================

#[test]
fn test_buffer_usage_to_vk_combines_flags() {
    let flags = buffer_usage_to_vk(BufferUsage::STORAGE | BufferUsage::TRANSFER_DST);
    assert_eq!(
        flags,
        vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
    );
}

#[test]
fn test_buffer_usage_to_vk_each_flag() {
    assert_eq!(buffer_usage_to_vk(BufferUsage::UNIFORM), vk::BufferUsageFlags::UNIFORM_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::VERTEX), vk::BufferUsageFlags::VERTEX_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::INDEX), vk::BufferUsageFlags::INDEX_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::INDIRECT), vk::BufferUsageFlags::INDIRECT_BUFFER);
    assert_eq!(buffer_usage_to_vk(BufferUsage::TRANSFER_SRC), vk::BufferUsageFlags::TRANSFER_SRC);
    assert_eq!(buffer_usage_to_vk(BufferUsage::empty()), vk::BufferUsageFlags::empty());
}

#[test]
fn test_image_usage_to_vk() {
    let flags = image_usage_to_vk(ImageUsage::SAMPLED | ImageUsage::STORAGE | ImageUsage::TRANSFER_DST);
    assert_eq!(
        flags,
        vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::TRANSFER_DST
    );
    assert_eq!(
        image_usage_to_vk(ImageUsage::DEPTH_STENCIL_ATTACHMENT),
        vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
    );
    assert_eq!(
        image_usage_to_vk(ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_SRC),
        vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC
    );
}

// ============================================================================
// LAYOUT / MEMORY LOCATION TESTS
// ============================================================================

#[test]
fn test_image_layout_to_vk() {
    assert_eq!(image_layout_to_vk(ImageLayout::General), vk::ImageLayout::GENERAL);
    assert_eq!(
        image_layout_to_vk(ImageLayout::ShaderReadOnly),
        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    );
    assert_eq!(
        image_layout_to_vk(ImageLayout::DepthStencilReadOnly),
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
    );
    assert_eq!(image_layout_to_vk(ImageLayout::ReadOnly), vk::ImageLayout::READ_ONLY_OPTIMAL);
}

#[test]
fn test_memory_location_to_vk() {
    assert_eq!(
        memory_location_to_vk(MemoryLocation::GpuOnly),
        gpu_allocator::MemoryLocation::GpuOnly
    );
    assert_eq!(
        memory_location_to_vk(MemoryLocation::CpuToGpu),
        gpu_allocator::MemoryLocation::CpuToGpu
    );
    assert_eq!(
        memory_location_to_vk(MemoryLocation::GpuToCpu),
        gpu_allocator::MemoryLocation::GpuToCpu
    );
}
