/*!
# Bindless Lifetime

Backend-agnostic core of a bindless GPU resource-lifetime manager.

Every GPU-visible resource gets a persistent index into one global
descriptor table, and nothing (memory or descriptor slot) is reclaimed
before the GPU has provably finished with it. Synchronization relies on a
single monotonically increasing completion counter (a timeline semaphore).

## Architecture

- **Device**: owns the descriptor table and the deletion queues, drives frames
- **Backend**: trait implemented by native API crates (e.g. `bindless_lifetime_vulkan`)
- **IndexAllocator**: fixed-capacity slot pool, one per descriptor class
- **DescriptorHandle**: move-only RAII handle retiring its slot on drop
- **Buffer / Image**: RAII owners retiring their native object on drop
- **DeletionQueue / RetireList**: retired objects stamped with a submission number
*/

mod config;
mod device;
mod error;
pub mod allocator;
pub mod backend;
pub mod deletion;
pub mod descriptor;
pub mod log;
pub mod resource;

// Main bindless namespace module
pub mod bindless {
    // Error types
    pub use crate::error::{Error, Result};

    // Configuration
    pub use crate::config::{Config, DebugMessageFilter, DebugSeverity, TableConfig};

    // Device context
    pub use crate::device::{Device, FrameInfo, ReclaimStats};

    // Descriptor bookkeeping
    pub use crate::descriptor::{DescriptorHandle, DescriptorSlot, DescriptorTable, ResourceClass};

    // Resources
    pub use crate::resource::{Buffer, Image};

    // Native API seam
    pub use crate::backend::{
        Backend, BufferDesc, BufferUsage, DescriptorWrite, ImageDesc, ImageFormat, ImageLayout,
        ImageUsage, MemoryLocation,
    };

    // Logging sub-module (types and logger slot; gpu_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{
            log, log_detailed, min_severity, reset_logger, set_logger, set_min_severity,
            DefaultLogger, LogEntry, LogSeverity, Logger,
        };
    }
}
