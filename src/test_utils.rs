//! Test utilities for Warden.
//!
//! This module provides shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Isolated runtime constructors on a manual clock
//!
//! # Example
//! ```
//! use warden::test_utils::{init_test_logging, test_runtime};
//!
//! init_test_logging();
//! let (runtime, clock) = test_runtime();
//! clock.advance_millis(5);
//! runtime.shutdown();
//! ```

use crate::runtime::{Clock, ManualClock, Runtime, RuntimeBuilder};
use crate::trace::{RingSink, TelemetrySink};
use std::sync::{Arc, Once};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Create an isolated runtime on a manual clock.
///
/// Returns the runtime and the clock handle so tests can drive time
/// deterministically.
#[must_use]
pub fn test_runtime() -> (Runtime, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let runtime = RuntimeBuilder::new()
        .clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .build()
        .expect("failed to build test runtime");
    (runtime, clock)
}

/// Create an isolated runtime with an inspectable telemetry ring.
#[must_use]
pub fn test_runtime_with_telemetry() -> (Runtime, Arc<ManualClock>, Arc<RingSink>) {
    let clock = Arc::new(ManualClock::new());
    let sink = Arc::new(RingSink::new(4096));
    let runtime = RuntimeBuilder::new()
        .clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .telemetry(Arc::clone(&sink) as Arc<dyn TelemetrySink>)
        .build()
        .expect("failed to build test runtime");
    (runtime, clock, sink)
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
