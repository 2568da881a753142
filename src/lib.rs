//! Warden: a governance-first concurrency runtime.
//!
//! # Overview
//!
//! Warden supervises worker tasks under explicit governance: every task
//! carries a policy describing its genealogy, destruction behavior, and
//! execution limits. Access to shared resources is arbitrated through a
//! bounded token pool, and cooperative context switches between related
//! tasks are validated before any custody changes hands.
//!
//! # Core Guarantees
//!
//! - **Governed lifecycle**: every task moves through an explicit state
//!   machine (`New → Running → (Yielded ↔ Running)* → Terminating → Terminated`)
//!   and `Terminated` is absorbing
//! - **Genealogy invariants**: hierarchy depth and direct-child counts are
//!   enforced before registration, never after the fact
//! - **Token custody**: a terminated task owns no tokens; custody moves only
//!   across a validated context switch
//! - **Deterministic destruction**: children of a destroyed parent are
//!   visited in ascending task-id order
//! - **Dual scheduling**: single-threaded cooperative execution and true
//!   OS-thread parallelism under one policy surface
//!
//! # Module Structure
//!
//! - [`types`]: Core types (identifiers, modes, policies, termination status)
//! - [`record`]: Internal task records and cross-thread governed state
//! - [`registry`]: Process-wide task registry with genealogy lookup
//! - [`token`]: Bounded token pool for resource arbitration
//! - [`runtime`]: Lifecycle engine, destruction policies, context-switch
//!   governor, cooperative scheduler, and clock sources
//! - [`trace`]: Telemetry events, ring buffer, and export
//! - [`error`]: Error types
//!
//! # Quick start
//!
//! ```ignore
//! use warden::runtime::RuntimeBuilder;
//! use warden::types::{TaskPolicy, WorkStatus};
//!
//! let runtime = RuntimeBuilder::new().build()?;
//! let policy = TaskPolicy::builder(100).build();
//! let id = runtime.spawn(policy, || WorkStatus::Complete)?;
//! let status = runtime.join(id)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod record;
pub mod registry;
pub mod runtime;
pub mod test_utils;
pub mod token;
pub mod trace;
pub mod tracing_compat;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use registry::{TaskRegistry, MAX_CHILDREN_PER_PROCESS, MAX_HIERARCHY_DEPTH, MAX_TASKS};
pub use runtime::{
    init_runtime, runtime, shutdown_runtime, Clock, ManualClock, MonotonicClock, Runtime,
    RuntimeBuilder, RuntimeConfig, YIELD_PERIOD,
};
pub use token::{AccessMask, ResourceName, TokenPool, TokenRequest, TOKEN_POOL_CAPACITY};
pub use trace::{RingSink, TelemetrySink, TraceEvent, TraceEventKind};
pub use types::{
    ConcurrencyMode, DestroyPolicy, TaskId, TaskPolicy, TerminationCause, TerminationStatus, Time,
    TokenId, Work, WorkStatus,
};
