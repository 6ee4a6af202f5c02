use std::fmt;

/// Kind of descriptor a bindless slot holds.
///
/// Selects the descriptor array (binding), the slot allocator and the
/// capacity pool. `Invalid` is the "no handle" marker and owns nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceClass {
    StorageBuffer,
    CombinedImageSampler,
    StorageImage,
    SampledImage,
    Sampler,
    #[default]
    Invalid,
}

impl ResourceClass {
    /// Every class backed by an allocator, in binding order
    pub const ALL: [ResourceClass; 5] = [
        ResourceClass::StorageBuffer,
        ResourceClass::CombinedImageSampler,
        ResourceClass::StorageImage,
        ResourceClass::SampledImage,
        ResourceClass::Sampler,
    ];

    /// Binding number of this class inside the bindless set
    pub fn binding(self) -> Option<u32> {
        match self {
            ResourceClass::StorageBuffer => Some(0),
            ResourceClass::CombinedImageSampler => Some(1),
            ResourceClass::StorageImage => Some(2),
            ResourceClass::SampledImage => Some(3),
            ResourceClass::Sampler => Some(4),
            ResourceClass::Invalid => None,
        }
    }

    /// Whether the class draws from the sampler capacity pool
    pub fn is_sampler(self) -> bool {
        self == ResourceClass::Sampler
    }

    pub fn is_valid(self) -> bool {
        self != ResourceClass::Invalid
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
