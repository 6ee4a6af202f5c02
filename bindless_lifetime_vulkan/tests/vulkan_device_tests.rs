//! GPU tests for the Vulkan backend
//!
//! These tests drive a real `Device<VulkanBackend>`.
//! All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use ash::vk;
use bindless_lifetime::bindless::{
    Backend, BufferDesc, BufferUsage, Config, Device, Error, ImageDesc, ImageFormat, ImageLayout, ImageUsage,
    MemoryLocation, ResourceClass, TableConfig,
};
use bindless_lifetime_vulkan::{create_device, SamplerType, VulkanBackend, VulkanDevice};
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a test window for Vulkan
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Bindless Device Test")
        .with_inner_size(winit::dpi::LogicalSize::new(320, 240))
        .with_visible(false); // Hidden window for tests
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn test_config() -> Config {
    Config {
        enable_validation: false,
        ..Config::default()
    }
}

fn create_test_device(window: &Window, config: Config) -> VulkanDevice {
    create_device(window, config).unwrap()
}

fn storage_desc(size: u64, location: MemoryLocation) -> BufferDesc {
    BufferDesc {
        size,
        usage: BufferUsage::STORAGE,
        location,
        name: "test storage".to_string(),
    }
}

fn image_desc(usage: ImageUsage) -> ImageDesc {
    ImageDesc {
        width: 64,
        height: 64,
        mip_levels: 1,
        format: ImageFormat::R8G8B8A8_UNORM,
        usage,
        name: "test image".to_string(),
    }
}

fn run_empty_frame(device: &mut VulkanDevice) {
    device.begin_frame().unwrap();
    let cmd = device.frame_commands().unwrap();
    device.submit_frame(&cmd).unwrap();
}

// ============================================================================
// BRING-UP TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_device_creation() {
    let (window, _event_loop) = create_test_window();
    let device = create_test_device(&window, test_config());

    assert_eq!(device.completed_submission(), 0);
    assert_eq!(device.current_submission(), 0);
    assert_ne!(device.backend().descriptor_set(), vk::DescriptorSet::null());
    assert_ne!(device.backend().pipeline_layout(), vk::PipelineLayout::null());
    assert_eq!(device.backend().frames_in_flight(), 2);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_rejects_zero_frames_in_flight() {
    let (window, _event_loop) = create_test_window();
    let config = Config {
        frames_in_flight: 0,
        ..test_config()
    };

    let result = create_device(&window, config);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_rejects_table_larger_than_native_set() {
    let (window, _event_loop) = create_test_window();
    let native = Config {
        table: TableConfig {
            max_resource_descriptors: 4,
            max_sampler_descriptors: 4,
        },
        ..test_config()
    };
    let backend = VulkanBackend::new(&window, &native).unwrap();

    let requested = Config {
        table: TableConfig {
            max_resource_descriptors: 8,
            max_sampler_descriptors: 8,
        },
        ..test_config()
    };
    let result = Device::new(backend, requested);
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

// ============================================================================
// DESCRIPTOR TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_storage_buffer_descriptor() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    let (buffer, handle) = device
        .create_storage_buffer(&storage_desc(256, MemoryLocation::CpuToGpu))
        .unwrap();

    assert_eq!(handle.class(), ResourceClass::StorageBuffer);
    assert_eq!(handle.index(), 0);
    assert_eq!(buffer.size(), 256);
    assert!(device.table().is_allocated(ResourceClass::StorageBuffer, 0));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_image_descriptors() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    let image = device
        .create_image(&image_desc(ImageUsage::SAMPLED | ImageUsage::STORAGE))
        .unwrap();
    let sampler = device.backend_mut().sampler(SamplerType::LinearClamp).unwrap();

    let sampled = device
        .allocate_sampled_image_descriptor(image.view(), ImageLayout::ShaderReadOnly)
        .unwrap();
    let storage = device
        .allocate_storage_image_descriptor(image.view(), ImageLayout::General)
        .unwrap();
    let combined = device
        .allocate_combined_image_sampler_descriptor(&sampler, image.view(), ImageLayout::ShaderReadOnly)
        .unwrap();
    let sampler_handle = device.allocate_sampler_descriptor(&sampler).unwrap();

    assert_eq!(sampled.class(), ResourceClass::SampledImage);
    assert_eq!(storage.class(), ResourceClass::StorageImage);
    assert_eq!(combined.class(), ResourceClass::CombinedImageSampler);
    assert_eq!(sampler_handle.class(), ResourceClass::Sampler);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_descriptor_exhaustion() {
    let (window, _event_loop) = create_test_window();
    let config = Config {
        table: TableConfig {
            max_resource_descriptors: 4,
            max_sampler_descriptors: 2,
        },
        ..test_config()
    };
    let mut device = create_test_device(&window, config);

    let buffer = device
        .create_buffer(&storage_desc(64, MemoryLocation::CpuToGpu))
        .unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| device.allocate_storage_buffer_descriptor(&buffer).unwrap())
        .collect();

    let result = device.allocate_storage_buffer_descriptor(&buffer);
    assert_eq!(
        result.unwrap_err(),
        Error::AllocatorExhausted {
            class: ResourceClass::StorageBuffer,
            capacity: 4
        }
    );
    drop(handles);
}

// ============================================================================
// LIFETIME TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_slot_reused_after_gpu_completes() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    run_empty_frame(&mut device);

    let (buffer, handle) = device
        .create_storage_buffer(&storage_desc(64, MemoryLocation::CpuToGpu))
        .unwrap();
    let index = handle.index();
    drop(handle);
    drop(buffer);

    let pending = device.pending_destructions();
    assert_eq!(pending.buffers, 1);
    assert_eq!(pending.descriptors, 1);

    let reclaimed = device.wait_idle().unwrap();
    assert_eq!(reclaimed.buffers, 1);
    assert_eq!(reclaimed.descriptors, 1);

    let (_buffer, reused) = device
        .create_storage_buffer(&storage_desc(64, MemoryLocation::CpuToGpu))
        .unwrap();
    assert_eq!(reused.index(), index);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_frame_loop_advances_counter() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    for _ in 0..5 {
        run_empty_frame(&mut device);
    }
    device.wait_idle().unwrap();

    assert_eq!(device.current_submission(), 5);
    assert_eq!(device.completed_submission(), 5);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_image_destroyed_after_frames() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    let image = device.create_image(&image_desc(ImageUsage::SAMPLED)).unwrap();
    run_empty_frame(&mut device);
    drop(image);

    assert_eq!(device.pending_destructions().images, 1);
    for _ in 0..3 {
        run_empty_frame(&mut device);
    }
    device.wait_idle().unwrap();
    assert_eq!(device.pending_destructions().images, 0);
}

// ============================================================================
// TRANSFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_write_host_visible_buffer() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    let buffer = device
        .create_buffer(&storage_desc(16, MemoryLocation::CpuToGpu))
        .unwrap();
    device.write_buffer(&buffer, 4, &[1, 2, 3, 4]).unwrap();

    let result = device.write_buffer(&buffer, 14, &[1, 2, 3, 4]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));

    // The backend checks the range itself too
    let result = device.backend().write_buffer(buffer.native(), buffer.size(), &[0u8; 64]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
    let result = device.backend_mut().upload_buffer(buffer.native(), 8, &[0u8; 64]);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_upload_device_local_buffer() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    let buffer = device
        .create_buffer(&storage_desc(1024, MemoryLocation::GpuOnly))
        .unwrap();
    let data: Vec<u8> = (0..=255).collect();

    device.upload_buffer(&buffer, 256, &data).unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_immediate_submit_fill() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    let buffer = device
        .create_buffer(&storage_desc(64, MemoryLocation::GpuOnly))
        .unwrap();
    let handle = buffer.handle();
    let vk_device = device.backend().device().clone();

    device
        .immediate_submit(|cmd| unsafe {
            vk_device.cmd_fill_buffer(*cmd, handle, 0, vk::WHOLE_SIZE, 0);
        })
        .unwrap();
}

// ============================================================================
// SAMPLER CACHE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_sampler_cache_reuses_samplers() {
    let (window, _event_loop) = create_test_window();
    let mut device = create_test_device(&window, test_config());

    let first = device.backend_mut().sampler(SamplerType::LinearRepeat).unwrap();
    let second = device.backend_mut().sampler(SamplerType::LinearRepeat).unwrap();
    let shadow = device.backend_mut().sampler(SamplerType::Shadow).unwrap();

    assert_eq!(first, second);
    assert_ne!(first, shadow);
    assert_eq!(device.backend().cached_sampler_count(), 2);
}
