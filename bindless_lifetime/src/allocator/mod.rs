//! Fixed-capacity slot allocation for the bindless descriptor table

mod index_allocator;

pub use index_allocator::IndexAllocator;
