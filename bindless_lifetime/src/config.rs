//! Device configuration
//!
//! Capacities of the bindless descriptor table, frames-in-flight depth and
//! validation-layer options. Backends receive the whole [`Config`] at
//! construction time.

use crate::error::{Error, Result};

/// Descriptor table capacities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableConfig {
    /// Slots per non-sampler class (storage buffer, combined image sampler,
    /// storage image, sampled image)
    pub max_resource_descriptors: u32,
    /// Slots of the sampler class
    pub max_sampler_descriptors: u32,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            max_resource_descriptors: 10_000,
            max_sampler_descriptors: 100,
        }
    }
}

/// Which validation messages are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    ErrorsOnly,
    ErrorsAndWarnings,
    All,
}

/// Validation message categories to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Configuration for a [`crate::bindless::Device`] and its backend
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Minimum severity of validation messages forwarded to the logger
    pub debug_severity: DebugSeverity,
    /// Categories of validation messages forwarded to the logger
    pub debug_message_filter: DebugMessageFilter,
    /// Count validation messages per severity
    pub enable_validation_stats: bool,
    /// Panic on the first validation error, once the native call that
    /// triggered it has returned
    pub panic_on_error: bool,
    /// Number of frames the CPU may record ahead of the GPU
    pub frames_in_flight: u32,
    /// Descriptor table capacities
    pub table: TableConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Bindless Application".to_string(),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_message_filter: DebugMessageFilter::default(),
            enable_validation_stats: true,
            panic_on_error: false,
            frames_in_flight: 2,
            table: TableConfig::default(),
        }
    }
}

impl Config {
    /// Reject configurations no device can be built from
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InitializationFailed(
                "frames_in_flight must be at least 1".to_string(),
            ));
        }
        if self.table.max_resource_descriptors == 0 || self.table.max_sampler_descriptors == 0 {
            return Err(Error::InitializationFailed(format!(
                "descriptor capacities must be non-zero (resources: {}, samplers: {})",
                self.table.max_resource_descriptors, self.table.max_sampler_descriptors
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
