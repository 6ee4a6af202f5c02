//! Native GPU API seam
//!
//! The core only talks to the GPU through [`Backend`]. The Vulkan
//! implementation lives in the `bindless_lifetime_vulkan` crate.

mod backend;
#[cfg(test)]
pub(crate) mod mock_backend;

pub use backend::{
    Backend, BufferDesc, BufferUsage, DescriptorWrite, ImageDesc, ImageFormat, ImageLayout,
    ImageUsage, MemoryLocation,
};
