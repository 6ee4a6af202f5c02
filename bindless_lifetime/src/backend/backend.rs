use bitflags::bitflags;

use crate::config::TableConfig;
use crate::descriptor::ResourceClass;
use crate::error::Result;

bitflags! {
    /// How a buffer will be used by the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        const STORAGE = 1 << 0;
        const UNIFORM = 1 << 1;
        const VERTEX = 1 << 2;
        const INDEX = 1 << 3;
        const INDIRECT = 1 << 4;
        const TRANSFER_SRC = 1 << 5;
        const TRANSFER_DST = 1 << 6;
    }
}

bitflags! {
    /// How an image will be used by the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const SAMPLED = 1 << 0;
        const STORAGE = 1 << 1;
        const COLOR_ATTACHMENT = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT = 1 << 3;
        const TRANSFER_SRC = 1 << 4;
        const TRANSFER_DST = 1 << 5;
    }
}

/// Where buffer memory lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryLocation {
    /// Device-local, filled through the immediate submission channel
    #[default]
    GpuOnly,
    /// Host-visible and mapped, written directly by the CPU
    CpuToGpu,
    /// Host-visible readback
    GpuToCpu,
}

/// Image pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum ImageFormat {
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R16G16B16A16_SFLOAT,
    R32G32B32A32_SFLOAT,
    R32_SFLOAT,
    R32_UINT,
    D16_UNORM,
    D32_FLOAT,
}

impl ImageFormat {
    pub fn is_depth(self) -> bool {
        matches!(self, ImageFormat::D16_UNORM | ImageFormat::D32_FLOAT)
    }
}

/// Layout an image is in when accessed through its descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    General,
    ShaderReadOnly,
    DepthStencilReadOnly,
    ReadOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDesc {
    pub size: u64,
    pub usage: BufferUsage,
    pub location: MemoryLocation,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub format: ImageFormat,
    pub usage: ImageUsage,
    pub name: String,
}

/// Payload of a single descriptor write
pub enum DescriptorWrite<'a, B: Backend + ?Sized> {
    StorageBuffer(&'a B::Buffer),
    CombinedImageSampler {
        sampler: &'a B::Sampler,
        view: &'a B::ImageView,
        layout: ImageLayout,
    },
    StorageImage {
        view: &'a B::ImageView,
        layout: ImageLayout,
    },
    SampledImage {
        view: &'a B::ImageView,
        layout: ImageLayout,
    },
    Sampler(&'a B::Sampler),
}

impl<B: Backend + ?Sized> DescriptorWrite<'_, B> {
    pub fn class(&self) -> ResourceClass {
        match self {
            DescriptorWrite::StorageBuffer(_) => ResourceClass::StorageBuffer,
            DescriptorWrite::CombinedImageSampler { .. } => ResourceClass::CombinedImageSampler,
            DescriptorWrite::StorageImage { .. } => ResourceClass::StorageImage,
            DescriptorWrite::SampledImage { .. } => ResourceClass::SampledImage,
            DescriptorWrite::Sampler(_) => ResourceClass::Sampler,
        }
    }
}

/// Native GPU API used by [`crate::bindless::Device`].
///
/// A backend owns the logical device, the graphics queue, the timeline
/// semaphore, the bindless descriptor set, the immediate submission
/// command buffer and the per-frame command pools. Every call is made from
/// the device's owner thread.
pub trait Backend {
    /// Native buffer (buffer + memory)
    type Buffer: Send + 'static;
    /// Native image (image + default view + memory)
    type Image: Send + 'static;
    type ImageView;
    type Sampler;
    type CommandBuffer;

    /// Capacities the native descriptor set was created with
    fn table_config(&self) -> TableConfig;

    /// Number of per-frame command pools
    fn frames_in_flight(&self) -> u32;

    /// Default view of an image
    fn image_view(image: &Self::Image) -> &Self::ImageView;

    fn create_buffer(&mut self, desc: &BufferDesc) -> Result<Self::Buffer>;

    fn create_image(&mut self, desc: &ImageDesc) -> Result<Self::Image>;

    /// Write host-visible buffer memory directly
    fn write_buffer(&self, buffer: &Self::Buffer, offset: u64, data: &[u8]) -> Result<()>;

    /// Copy `data` into a device-local buffer through a staging buffer
    fn upload_buffer(&mut self, buffer: &Self::Buffer, offset: u64, data: &[u8]) -> Result<()>;

    /// Destroy a buffer the GPU is done with
    fn destroy_buffer(&mut self, buffer: Self::Buffer);

    /// Destroy an image the GPU is done with (view first, then image)
    fn destroy_image(&mut self, image: Self::Image);

    /// Point `slot` of the write's class at the given resource, immediately
    fn write_descriptor(&mut self, slot: u32, write: DescriptorWrite<'_, Self>) -> Result<()>;

    /// Current value of the GPU completion counter
    fn completed_value(&self) -> Result<u64>;

    /// Block until the completion counter reaches `value`
    fn wait_for_value(&self, value: u64) -> Result<()>;

    /// Reset the command pool of `frame_slot` and begin its command buffer
    fn begin_frame_commands(&mut self, frame_slot: u32) -> Result<Self::CommandBuffer>;

    /// End and submit a frame command buffer, signalling `signal_value`
    fn submit_frame(
        &mut self,
        frame_slot: u32,
        command_buffer: &Self::CommandBuffer,
        signal_value: u64,
    ) -> Result<()>;

    /// Record work with `record`, submit it and block until the queue is idle
    fn immediate_submit<F: FnOnce(&Self::CommandBuffer)>(&mut self, record: F) -> Result<()>;

    /// Block until the device is idle
    fn wait_idle(&self) -> Result<()>;
}
