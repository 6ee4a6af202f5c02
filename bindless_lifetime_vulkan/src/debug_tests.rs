//! Unit tests for the validation message filter and statistics
//!
//! No GPU required: the callback is invoked directly with hand-built data.

use super::*;
use bindless_lifetime::bindless::log::{reset_logger, set_logger, LogEntry, Logger};
use serial_test::serial;
use std::sync::{Arc, Mutex as StdMutex};

#[derive(Clone, Default)]
struct CaptureLogger {
    entries: Arc<StdMutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn invoke(severity: vk::DebugUtilsMessageSeverityFlagsEXT, ty: vk::DebugUtilsMessageTypeFlagsEXT, message: &CStr) {
    let mut data = vk::DebugUtilsMessengerCallbackDataEXT::default();
    data.p_message_id_name = c"VUID-test".as_ptr();
    data.p_message = message.as_ptr();
    unsafe {
        vulkan_debug_callback(severity, ty, &data, std::ptr::null_mut());
    }
}

fn test_config(severity: DebugSeverity) -> Config {
    Config {
        severity,
        message_filter: DebugMessageFilter::default(),
        panic_on_error: false,
        enable_stats: true,
    }
}

// ============================================================================
// FILTER MAPPING TESTS
// ============================================================================

#[test]
fn test_severity_flags_per_level() {
    assert_eq!(
        severity_flags(DebugSeverity::ErrorsOnly),
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
    );
    assert!(severity_flags(DebugSeverity::ErrorsAndWarnings)
        .contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
    assert!(!severity_flags(DebugSeverity::ErrorsAndWarnings)
        .contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
    assert!(severity_flags(DebugSeverity::All)
        .contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
}

#[test]
fn test_to_log_severity() {
    assert_eq!(to_log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), LogSeverity::Error);
    assert_eq!(to_log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING), LogSeverity::Warn);
    assert_eq!(to_log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::INFO), LogSeverity::Info);
    assert_eq!(to_log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), LogSeverity::Trace);
}

#[test]
fn test_category_filter() {
    let filter = DebugMessageFilter {
        show_general: false,
        show_validation: true,
        show_performance: false,
    };
    assert!(category_enabled(&filter, vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION));
    assert!(!category_enabled(&filter, vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE));
    assert!(!category_enabled(&filter, vk::DebugUtilsMessageTypeFlagsEXT::GENERAL));
}

#[test]
fn test_validation_stats_total() {
    let stats = ValidationStats {
        errors: 1,
        warnings: 2,
        info: 3,
        verbose: 4,
    };
    assert_eq!(stats.total(), 10);
    assert!(stats.has_errors());
    assert!(!ValidationStats::default().has_errors());
}

#[test]
fn test_message_tracker_counts_repeats() {
    let mut tracker = MessageTracker::default();
    assert_eq!(tracker.track_message("a"), 1);
    assert_eq!(tracker.track_message("a"), 2);
    assert_eq!(tracker.track_message("b"), 1);
    assert_eq!(tracker.duplicate_count(), 1);
}

#[test]
fn test_message_tracker_is_capped() {
    let mut tracker = MessageTracker::default();
    for i in 0..MAX_TRACKED_MESSAGES + 10 {
        tracker.track_message(&format!("message {}", i));
    }
    assert_eq!(tracker.messages.len(), MAX_TRACKED_MESSAGES);

    // Known messages keep counting, new ones are reported once
    assert_eq!(tracker.track_message("message 0"), 2);
    let overflow = format!("message {}", MAX_TRACKED_MESSAGES + 5);
    assert_eq!(tracker.track_message(&overflow), 1);
    assert_eq!(tracker.track_message(&overflow), 1);
}

// ============================================================================
// CALLBACK TESTS
// ============================================================================

#[test]
#[serial]
fn test_callback_forwards_to_logger_and_counts() {
    let logger = CaptureLogger::default();
    set_logger(logger.clone());
    init_debug_config(test_config(DebugSeverity::ErrorsAndWarnings));

    invoke(
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        c"descriptor in use",
    );
    invoke(
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        c"descriptor in use",
    );
    // Below the configured severity
    invoke(
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
        c"loader info",
    );

    let stats = get_validation_stats();
    cleanup_debug_config();
    reset_logger();

    assert_eq!(stats.errors, 2);
    assert_eq!(stats.info, 0);

    let entries = logger.entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].source, "bindless::vulkan::validation");
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].message.contains("VUID-test"));
    assert!(entries[1].message.contains("[x2]"));
}

#[test]
#[serial]
fn test_callback_ignored_without_config() {
    let logger = CaptureLogger::default();
    set_logger(logger.clone());
    cleanup_debug_config();

    invoke(
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        c"after shutdown",
    );

    reset_logger();
    assert!(logger.entries.lock().unwrap().is_empty());
}

#[test]
#[serial]
fn test_panic_on_error_is_deferred_out_of_callback() {
    let logger = CaptureLogger::default();
    set_logger(logger.clone());
    init_debug_config(Config {
        panic_on_error: true,
        ..test_config(DebugSeverity::ErrorsAndWarnings)
    });

    // Returns normally instead of unwinding through the FFI boundary
    invoke(
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        c"first error",
    );
    invoke(
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
        c"second error",
    );

    let raised = std::panic::catch_unwind(raise_pending_error);
    let pending_after = take_pending_error();
    cleanup_debug_config();
    reset_logger();

    let payload = raised.unwrap_err();
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(message.contains("first error"));
    assert!(!message.contains("second error"));
    assert!(pending_after.is_none());
    assert_eq!(logger.entries.lock().unwrap().len(), 2);
}

#[test]
#[serial]
fn test_warnings_do_not_record_pending_error() {
    let logger = CaptureLogger::default();
    set_logger(logger.clone());
    init_debug_config(Config {
        panic_on_error: true,
        ..test_config(DebugSeverity::ErrorsAndWarnings)
    });

    invoke(
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        c"slow path",
    );

    let pending = take_pending_error();
    cleanup_debug_config();
    reset_logger();

    assert!(pending.is_none());
    raise_pending_error();
}
