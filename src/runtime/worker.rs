//! The governed worker loop.
//!
//! Both execution modes drive the same loop: execute one work cycle, then
//! check the cancel flag, the trace cap, the execution deadline, and the
//! cooperative yield point, in that order. The loop runs as a *slice*: it
//! returns either a termination cause or a yield, and the caller (OS worker
//! thread or cooperative driver) decides what a yield means.

use super::clock::Clock;
use crate::record::{TaskShared, TaskState};
use crate::token::TokenPool;
use crate::trace::{TelemetrySink, TraceEvent, TraceEventKind};
use crate::tracing_compat::trace;
use crate::types::{ConcurrencyMode, TaskPolicy, TerminationCause, Work, WorkStatus};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Number of work cycles between cooperative yields in simulated mode.
pub const YIELD_PERIOD: u64 = 10;

/// Everything a worker needs besides the task itself.
///
/// Individually shared so the cooperative driver and parallel workers hold
/// no reference cycle back to the runtime.
#[derive(Clone)]
pub(crate) struct WorkerEnv {
    pub clock: Arc<dyn Clock>,
    pub pool: Arc<Mutex<TokenPool>>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

/// A spawned task bound to its work object.
pub(crate) struct GovernedTask {
    pub shared: Arc<TaskShared>,
    pub policy: Arc<TaskPolicy>,
    pub work: Box<dyn Work>,
}

/// Outcome of one scheduling slice.
pub(crate) enum Slice {
    /// The task reached a cooperative yield point.
    Yielded,
    /// The task finished; tokens not yet reclaimed.
    Finished(TerminationCause),
}

/// Runs the worker loop until the task yields or finishes.
pub(crate) fn run_slice(task: &mut GovernedTask, env: &WorkerEnv) -> Slice {
    let shared = &task.shared;
    let resumed = shared.state() == TaskState::Yielded;
    if !shared.transition(TaskState::Running) {
        // Terminated while queued; nothing left to run.
        return Slice::Finished(
            shared
                .cancel_requested()
                .map_or(TerminationCause::Immediate, |kind| kind.cause()),
        );
    }
    let kind = if resumed {
        TraceEventKind::Resume
    } else {
        TraceEventKind::Start
    };
    env.telemetry
        .record(TraceEvent::ok(env.clock.now(), kind, shared.id(), 0));

    loop {
        if let Some(kind) = shared.cancel_requested() {
            return Slice::Finished(kind.cause());
        }

        let status = match catch_unwind(AssertUnwindSafe(|| task.work.cycle())) {
            Ok(status) => status,
            Err(payload) => {
                return Slice::Finished(TerminationCause::Fault(panic_message(&*payload)));
            }
        };

        let cycles = shared.record_cycle();
        trace!(task = %shared.id(), cycles, "work cycle complete");

        if status == WorkStatus::Complete {
            return Slice::Finished(TerminationCause::Natural);
        }

        let now = env.clock.now();
        if task.policy.trace_capped && shared.generation_depth() > task.policy.max_trace_depth {
            return Slice::Finished(TerminationCause::TraceCap);
        }
        if task.policy.max_execution_time_ms > 0
            && now.millis_since(shared.creation_time()) > task.policy.max_execution_time_ms
        {
            return Slice::Finished(TerminationCause::Deadline);
        }
        shared.heartbeat(now);

        if let Some(kind) = shared.cancel_requested() {
            return Slice::Finished(kind.cause());
        }

        if task.policy.mode == ConcurrencyMode::Simulated
            && task.policy.return_to_main_required
            && cycles % YIELD_PERIOD == 0
            && shared.transition(TaskState::Yielded)
        {
            env.telemetry.record(TraceEvent::ok(
                env.clock.now(),
                TraceEventKind::Yield,
                shared.id(),
                0,
            ));
            return Slice::Yielded;
        }
    }
}

/// Winds a finished task down: `Terminating`, token reclamation,
/// `Terminated`, joiner wakeup.
pub(crate) fn finalize(shared: &Arc<TaskShared>, env: &WorkerEnv, cause: TerminationCause) {
    shared.transition(TaskState::Terminating);
    env.telemetry.record(TraceEvent::ok(
        env.clock.now(),
        TraceEventKind::Terminating,
        shared.id(),
        0,
    ));

    let reclaimed = env.pool.lock().reclaim_owned_by(shared.id());
    if reclaimed > 0 {
        env.telemetry.record(TraceEvent::ok(
            env.clock.now(),
            TraceEventKind::TokenReclaim,
            shared.id(),
            reclaimed as u64,
        ));
    }

    // Record before waking joiners so a joiner's telemetry snapshot
    // already contains the terminal event.
    env.telemetry.record(TraceEvent {
        at: env.clock.now(),
        kind: TraceEventKind::Terminated,
        task: shared.id(),
        other: 0,
        outcome: cause.stable_name(),
    });
    shared.complete(cause);
}

/// Body of a parallel-mode OS worker: slices until finished.
pub(crate) fn run_to_completion(mut task: GovernedTask, env: &WorkerEnv) {
    loop {
        match run_slice(&mut task, env) {
            Slice::Yielded => std::thread::yield_now(),
            Slice::Finished(cause) => {
                finalize(&task.shared, env, cause);
                return;
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload.downcast_ref::<&str>().map_or_else(
        || {
            payload
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "worker panicked".to_string())
        },
        |s| (*s).to_string(),
    )
}
