//! Telemetry events for governance decisions.
//!
//! The runtime emits one structured record per lifecycle transition, token
//! operation, and context-switch decision. Within a single task its events
//! are totally ordered; across tasks only causally related events are
//! ordered. The transport is left to the embedder via [`TelemetrySink`];
//! the default sink retains recent events in a ring buffer and can export
//! them as NDJSON.

pub mod buffer;
pub mod event;
pub mod sink;

pub use buffer::TraceBuffer;
pub use event::{TraceEvent, TraceEventKind};
pub use sink::{NullSink, RingSink, TelemetrySink};
