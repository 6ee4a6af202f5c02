use std::fmt;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::Arc;

use crate::backend::{Backend, BufferDesc, MemoryLocation};
use crate::deletion::RetireList;

/// Owned GPU buffer, retired on drop
pub struct Buffer<B: Backend> {
    native: ManuallyDrop<B::Buffer>,
    size: u64,
    location: MemoryLocation,
    retire: Arc<RetireList<B::Buffer>>,
}

impl<B: Backend> Buffer<B> {
    pub(crate) fn new(native: B::Buffer, desc: &BufferDesc, retire: Arc<RetireList<B::Buffer>>) -> Self {
        Self {
            native: ManuallyDrop::new(native),
            size: desc.size,
            location: desc.location,
            retire,
        }
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn location(&self) -> MemoryLocation {
        self.location
    }

    pub fn native(&self) -> &B::Buffer {
        &self.native
    }
}

impl<B: Backend> Deref for Buffer<B> {
    type Target = B::Buffer;

    fn deref(&self) -> &B::Buffer {
        &self.native
    }
}

impl<B: Backend> Drop for Buffer<B> {
    fn drop(&mut self) {
        // SAFETY: `native` is never touched again after this point
        let native = unsafe { ManuallyDrop::take(&mut self.native) };
        self.retire.retire(native);
    }
}

impl<B: Backend> fmt::Debug for Buffer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("size", &self.size)
            .field("location", &self.location)
            .finish()
    }
}
