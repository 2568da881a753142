//! Runtime builder.
//!
//! The clock and telemetry sink are injected collaborators so tests can
//! instantiate isolated runtimes with manual time and inspectable
//! telemetry.

use super::clock::{Clock, MonotonicClock};
use super::config::RuntimeConfig;
use super::Runtime;
use crate::error::Result;
use crate::trace::{RingSink, TelemetrySink};
use std::sync::Arc;

/// Builder for [`Runtime`].
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    config: Option<RuntimeConfig>,
    clock: Option<Arc<dyn Clock>>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
}

impl RuntimeBuilder {
    /// Creates a builder with all defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Injects a clock source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Injects a telemetry sink.
    #[must_use]
    pub fn telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds the runtime and starts its cooperative driver thread.
    pub fn build(self) -> Result<Runtime> {
        let config = self.config.unwrap_or_default();
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let telemetry = self
            .telemetry
            .unwrap_or_else(|| Arc::new(RingSink::new(config.trace_capacity)));
        Runtime::from_parts(clock, telemetry, &config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::clock::ManualClock;
    use crate::test_utils::init_test_logging;
    use crate::types::Time;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn build_with_defaults() {
        init_test("build_with_defaults");
        let runtime = RuntimeBuilder::new().build().expect("build");
        assert_eq!(runtime.task_count(), 0);
        assert_eq!(runtime.available_tokens(), crate::token::TOKEN_POOL_CAPACITY);
        runtime.shutdown();
        crate::test_complete!("build_with_defaults");
    }

    #[test]
    fn injected_clock_drives_timestamps() {
        init_test("injected_clock_drives_timestamps");
        let clock = Arc::new(ManualClock::new());
        clock.advance_millis(42);
        let runtime = RuntimeBuilder::new()
            .clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .build()
            .expect("build");
        assert_eq!(runtime.clock().now(), Time::from_millis(42));
        runtime.shutdown();
        crate::test_complete!("injected_clock_drives_timestamps");
    }
}
