#![allow(dead_code)]
//! Shared integration test utilities.
//!
//! Import with:
//! ```
//! mod common;
//! use common::*;
//! ```

pub use warden::test_utils::{
    init_test_logging, test_runtime, test_runtime_with_telemetry,
};
pub use warden::{assert_with_log, test_complete, test_phase, test_section};

use warden::types::{ConcurrencyMode, TaskId, TaskPolicy, WorkStatus};
use warden::Runtime;

/// Initialize logging and announce the test phase.
pub fn init_test(name: &str) {
    init_test_logging();
    test_phase!(name);
}

/// Spawn a simulated task that spins (yielding cooperatively) until
/// cancelled.
pub fn spawn_spinner(runtime: &Runtime, id: u64, parent: u64) -> TaskId {
    runtime
        .spawn(
            TaskPolicy::builder(id).parent(parent).build(),
            || WorkStatus::Pending,
        )
        .expect("spawn spinner")
}

/// Spawn a parallel task that spins until cancelled.
///
/// Parallel spinners stay in `Running` between cycles, so the test body can
/// acquire tokens on their behalf without racing a cooperative yield.
pub fn spawn_parallel_spinner(runtime: &Runtime, id: u64, parent: u64) -> TaskId {
    runtime
        .spawn(
            TaskPolicy::builder(id)
                .parent(parent)
                .mode(ConcurrencyMode::Parallel)
                .build(),
            || {
                std::thread::sleep(std::time::Duration::from_millis(1));
                WorkStatus::Pending
            },
        )
        .expect("spawn parallel spinner")
}

/// Gracefully terminate a task and wait for it.
pub fn drain(runtime: &Runtime, id: TaskId) {
    runtime.request_graceful(id).expect("request graceful");
    runtime.join(id).expect("join");
}
