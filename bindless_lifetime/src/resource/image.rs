use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::Arc;

use crate::backend::{Backend, ImageDesc, ImageFormat};
use crate::deletion::RetireList;

/// Owned GPU image with its default view, retired on drop
pub struct Image<B: Backend> {
    native: ManuallyDrop<B::Image>,
    width: u32,
    height: u32,
    mip_levels: u32,
    format: ImageFormat,
    retire: Arc<RetireList<B::Image>>,
}

impl<B: Backend> Image<B> {
    pub(crate) fn new(native: B::Image, desc: &ImageDesc, retire: Arc<RetireList<B::Image>>) -> Self {
        Self {
            native: ManuallyDrop::new(native),
            width: desc.width,
            height: desc.height,
            mip_levels: desc.mip_levels.max(1),
            format: desc.format,
            retire,
        }
    }

    /// Default view, used for sampled and storage descriptors
    pub fn view(&self) -> &B::ImageView {
        B::image_view(&self.native)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }
}

impl<B: Backend> Deref for Image<B> {
    type Target = B::Image;

    fn deref(&self) -> &B::Image {
        &self.native
    }
}

impl<B: Backend> Drop for Image<B> {
    fn drop(&mut self) {
        // SAFETY: `native` is never touched again after this point
        let native = unsafe { ManuallyDrop::take(&mut self.native) };
        self.retire.retire(native);
    }
}

impl<B: Backend> fmt::Debug for Image<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish()
    }
}
