/// Vulkan Debug Messenger - forwards validation layer messages to the logger
///
/// Messages are filtered by severity and category, counted per severity
/// and grouped by text so repeated messages are flagged.

use ash::vk;
use bindless_lifetime::bindless::log::{self as gpu_log, LogSeverity};
use bindless_lifetime::bindless::{DebugMessageFilter, DebugSeverity};
use colored::*;
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Global debug configuration (shared across callbacks)
static DEBUG_CONFIG: Mutex<Option<Config>> = Mutex::new(None);

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Global message tracker for grouping identical messages
static MESSAGE_TRACKER: Mutex<Option<MessageTracker>> = Mutex::new(None);

/// First validation error seen with `panic_on_error`, waiting to be raised
/// outside the FFI callback
static PENDING_ERROR: Mutex<Option<String>> = Mutex::new(None);

/// Distinct messages grouped before new ones stop being tracked
const MAX_TRACKED_MESSAGES: usize = 1024;

/// Debug configuration for the callback
#[derive(Debug, Clone, Copy)]
pub(crate) struct Config {
    pub severity: DebugSeverity,
    pub message_filter: DebugMessageFilter,
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

/// Validation message counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Thread-safe validation statistics tracker
struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn increment(&self, severity: LogSeverity) {
        let counter = match severity {
            LogSeverity::Error => &self.errors,
            LogSeverity::Warn => &self.warnings,
            LogSeverity::Info => &self.info,
            LogSeverity::Debug | LogSeverity::Trace => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Message tracker for grouping identical messages
#[derive(Default)]
struct MessageTracker {
    messages: FxHashMap<String, u32>,
}

impl MessageTracker {
    /// Occurrences of `message` so far; untracked messages count as 1
    fn track_message(&mut self, message: &str) -> u32 {
        if let Some(count) = self.messages.get_mut(message) {
            *count += 1;
            return *count;
        }
        if self.messages.len() < MAX_TRACKED_MESSAGES {
            self.messages.insert(message.to_string(), 1);
        }
        1
    }

    fn duplicate_count(&self) -> usize {
        self.messages.values().filter(|&&count| count > 1).count()
    }
}

/// Initialize debug configuration and reset statistics
pub(crate) fn init_debug_config(config: Config) {
    VALIDATION_STATS.reset();

    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(MessageTracker::default());
    }

    if let Ok(mut pending) = PENDING_ERROR.lock() {
        *pending = None;
    }

    if let Ok(mut slot) = DEBUG_CONFIG.lock() {
        *slot = Some(config);
    }
}

/// Stop forwarding messages (called before the messenger is destroyed)
pub(crate) fn cleanup_debug_config() {
    if let Ok(mut slot) = DEBUG_CONFIG.lock() {
        *slot = None;
    }
}

/// Take the validation error recorded under `panic_on_error`, if any
pub(crate) fn take_pending_error() -> Option<String> {
    PENDING_ERROR.lock().ok().and_then(|mut pending| pending.take())
}

/// Panic with the validation error recorded under `panic_on_error`
///
/// Unwinding out of the messenger callback would abort the process, so the
/// callback only records the error and the backend calls this afterwards.
pub(crate) fn raise_pending_error() {
    if let Some(message) = take_pending_error() {
        panic!("Validation error (panic_on_error)\n{}", message);
    }
}

/// Get current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Print validation statistics report
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics Report ===".bright_blue().bold());

    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(tracker_guard) = MESSAGE_TRACKER.lock() {
        if let Some(tracker) = tracker_guard.as_ref() {
            let duplicate_count = tracker.duplicate_count();
            if duplicate_count > 0 {
                println!("\n  {} message(s) appeared multiple times", duplicate_count);
            }
        }
    }

    println!("{}\n", "====================================".bright_blue().bold());
}

/// Vulkan severity flags requested from the messenger for a filter level
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

fn to_log_severity(message_severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Info
    } else {
        LogSeverity::Trace
    }
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

fn category_enabled(filter: &DebugMessageFilter, message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> bool {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        filter.show_validation
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        filter.show_performance
    } else {
        filter.show_general
    }
}

/// Vulkan debug messenger callback
///
/// Called by the validation layers. Routes every accepted message to the
/// process-wide logger under the `"bindless::vulkan::validation"` source.
pub(crate) unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id_name = if callback_data.p_message_id_name.is_null() {
        "Unknown"
    } else {
        CStr::from_ptr(callback_data.p_message_id_name)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };
    let message = if callback_data.p_message.is_null() {
        "No message"
    } else {
        CStr::from_ptr(callback_data.p_message)
            .to_str()
            .unwrap_or("Invalid UTF-8")
    };

    let config = match DEBUG_CONFIG.lock() {
        Ok(guard) => match *guard {
            Some(cfg) => cfg,
            None => return vk::FALSE,
        },
        Err(_) => return vk::FALSE,
    };

    if !severity_flags(config.severity).intersects(message_severity) {
        return vk::FALSE;
    }
    if !category_enabled(&config.message_filter, message_type) {
        return vk::FALSE;
    }

    let severity = to_log_severity(message_severity);
    if config.enable_stats {
        VALIDATION_STATS.increment(severity);
    }

    let occurrence_count = if config.enable_stats {
        match MESSAGE_TRACKER.lock() {
            Ok(mut guard) => guard.get_or_insert_with(MessageTracker::default).track_message(message),
            Err(_) => 1,
        }
    } else {
        1
    };

    let repeat_indicator = if occurrence_count > 1 {
        format!(" [x{}]", occurrence_count)
    } else {
        String::new()
    };

    gpu_log::log(
        severity,
        "bindless::vulkan::validation",
        format!(
            "[{}]{} {}: {}",
            message_type_name(message_type),
            repeat_indicator,
            message_id_name,
            message
        ),
    );

    if config.panic_on_error && severity == LogSeverity::Error {
        if let Ok(mut pending) = PENDING_ERROR.lock() {
            pending.get_or_insert_with(|| {
                format!(
                    "Message ID: {}\nType: {}\nMessage: {}",
                    message_id_name,
                    message_type_name(message_type),
                    message
                )
            });
        }
    }

    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
