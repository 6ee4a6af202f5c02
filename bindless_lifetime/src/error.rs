//! Error types for the bindless resource-lifetime manager
//!
//! Every fallible operation returns [`Result`]. Native API failures are
//! surfaced unchanged (no retries), descriptor exhaustion is fatal for the
//! requested class, and double frees signal a broken ownership invariant.

use std::fmt;

use crate::descriptor::ResourceClass;

/// Result type for bindless operations
pub type Result<T> = std::result::Result<T, Error>;

/// Bindless resource-lifetime errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Every slot of a descriptor class is in use
    AllocatorExhausted {
        class: ResourceClass,
        capacity: u32,
    },

    /// A native GPU API call failed (Vulkan result, allocator failure, ...)
    NativeApiFailure(String),

    /// A slot was returned that is not currently allocated
    DoubleFree {
        class: ResourceClass,
        slot: u32,
    },

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or argument (invalid class, oversized upload, ...)
    InvalidResource(String),

    /// Device or instance bring-up failed
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AllocatorExhausted { class, capacity } => write!(
                f,
                "Allocator exhausted: all {} {} slots are in use",
                capacity, class
            ),
            Error::NativeApiFailure(msg) => write!(f, "Native API failure: {}", msg),
            Error::DoubleFree { class, slot } => {
                write!(f, "Double free: {} slot {} is not allocated", class, slot)
            }
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
