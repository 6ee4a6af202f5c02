//! RAII owners of native GPU buffers and images
//!
//! Dropping one never destroys the native object; it is retired to the
//! device's deletion queue and destroyed once the GPU has caught up.

mod buffer;
mod image;

pub use buffer::Buffer;
pub use image::Image;
