//! Telemetry sinks.
//!
//! The runtime hands every [`TraceEvent`] to a [`TelemetrySink`]. The
//! default [`RingSink`] retains recent events and exports NDJSON (one JSON
//! object per line); embedders may supply their own transport.

use super::buffer::TraceBuffer;
use super::event::TraceEvent;
use crate::tracing_compat::debug;
use core::fmt;
use parking_lot::Mutex;
use std::io;

/// Receiver for telemetry events.
pub trait TelemetrySink: Send + Sync + fmt::Debug {
    /// Records one event.
    fn record(&self, event: TraceEvent);
}

/// Sink that retains recent events in a ring buffer.
#[derive(Debug)]
pub struct RingSink {
    buffer: Mutex<TraceBuffer>,
}

impl RingSink {
    /// Creates a sink retaining up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(TraceBuffer::new(capacity)),
        }
    }

    /// Returns a snapshot of retained events, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TraceEvent> {
        self.buffer.lock().iter().cloned().collect()
    }

    /// Writes retained events as NDJSON, one object per line.
    pub fn write_ndjson<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        for event in self.snapshot() {
            let line = serde_json::to_string(&event)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{line}")?;
        }
        Ok(())
    }

    /// Discards retained events.
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

impl TelemetrySink for RingSink {
    fn record(&self, event: TraceEvent) {
        debug!(
            kind = event.kind.stable_name(),
            task = %event.task,
            other = event.other,
            outcome = event.outcome,
            "telemetry"
        );
        self.buffer.lock().push(event);
    }
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&self, _event: TraceEvent) {}
}
