//! Bindless descriptor bookkeeping
//!
//! Resource classes, the per-class slot allocators and the RAII handle that
//! retires a slot when dropped.

mod descriptor_handle;
mod descriptor_table;
mod resource_class;

pub use descriptor_handle::{DescriptorHandle, DescriptorSlot};
pub use descriptor_table::DescriptorTable;
pub use resource_class::ResourceClass;
