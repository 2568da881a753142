//! Task lifecycle operations: spawn, join, termination requests, reaping.

use super::worker::{self, GovernedTask};
use super::Runtime;
use crate::error::{Error, ErrorKind, Result};
use crate::record::CancelKind;
use crate::trace::{TraceEvent, TraceEventKind};
use crate::tracing_compat::debug;
use crate::types::{ConcurrencyMode, TaskId, TaskPolicy, TerminationStatus, Work};
use core::panic::Location;
use std::sync::Arc;

impl Runtime {
    /// Registers a task under `policy` and starts its worker.
    ///
    /// In parallel mode an OS worker thread is launched; in simulated mode
    /// the task joins the cooperative run queue. Registration enforces the
    /// genealogy invariants (depth, child limit, capacity, id uniqueness)
    /// before any execution resource is created.
    #[track_caller]
    pub fn spawn(&self, policy: TaskPolicy, work: impl Work) -> Result<TaskId> {
        let location = Location::caller();
        let now = self.clock().now();
        let record = self.registry().lock().register(policy, now, location)?;
        let id = record.id();
        let parent = record.parent_id();
        self.telemetry().record(TraceEvent::ok(
            now,
            TraceEventKind::Spawn,
            id,
            parent.raw(),
        ));
        debug!(task = %id, parent = %parent, mode = %record.policy().mode, location = %location, "task spawned");

        let task = GovernedTask {
            shared: Arc::clone(record.shared()),
            policy: Arc::clone(record.policy()),
            work: Box::new(work),
        };
        match task.policy.mode {
            ConcurrencyMode::Simulated => {
                self.scheduler().enqueue(task);
            }
            ConcurrencyMode::Parallel => {
                let env = self.worker_env();
                let shared = Arc::clone(&task.shared);
                let handle = std::thread::Builder::new()
                    .name(format!("warden-{id}"))
                    .spawn(move || worker::run_to_completion(task, &env))
                    .map_err(|e| {
                        // The record stays registered but can never run;
                        // mark it terminated so joiners and reapers proceed.
                        shared.complete(crate::types::TerminationCause::Fault(format!(
                            "worker thread spawn failed: {e}"
                        )));
                        Error::new(ErrorKind::Internal)
                            .with_context(format!("failed to start worker for {id}: {e}"))
                    })?;
                self.workers().lock().insert(id, handle);
            }
        }
        Ok(id)
    }

    /// Blocks until the task reaches `Terminated` and returns its status.
    ///
    /// A worker fault is reported as a status with a fault cause, not as an
    /// error from `join` itself.
    pub fn join(&self, id: TaskId) -> Result<TerminationStatus> {
        let shared = self.lookup_shared(id)?;
        let status = shared.wait_terminated();
        if let Some(handle) = self.workers().lock().remove(&id) {
            let _ = handle.join();
        }
        Ok(status)
    }

    /// Requests graceful termination.
    ///
    /// The task observes the request at its next cooperative checkpoint and
    /// exits cleanly. A no-op for tasks already winding down.
    pub fn request_graceful(&self, id: TaskId) -> Result<()> {
        self.request_cancel(id, CancelKind::Graceful)
    }

    /// Requests immediate termination.
    ///
    /// Honored before the next work cycle; the runtime still reclaims the
    /// task's tokens when it observes termination.
    pub fn request_immediate(&self, id: TaskId) -> Result<()> {
        self.request_cancel(id, CancelKind::Immediate)
    }

    fn request_cancel(&self, id: TaskId, kind: CancelKind) -> Result<()> {
        let shared = self.lookup_shared(id)?;
        if shared.state().is_terminal() {
            return Ok(());
        }
        let recorded = shared.request_cancel(kind);
        if recorded {
            self.telemetry().record(TraceEvent::ok(
                self.clock().now(),
                TraceEventKind::CancelRequest,
                id,
                0,
            ));
        }
        // Wake a yielded simulated task so it observes the flag promptly.
        self.scheduler().prioritize(id);
        Ok(())
    }

    /// Removes a terminated task from the registry.
    ///
    /// Fails unless the task has reached `Terminated`; its tokens were
    /// reclaimed during wind-down.
    pub fn reap(&self, id: TaskId) -> Result<()> {
        self.registry().lock().unregister(id)?;
        self.telemetry()
            .record(TraceEvent::ok(self.clock().now(), TraceEventKind::Reap, id, 0));
        if let Some(handle) = self.workers().lock().remove(&id) {
            let _ = handle.join();
        }
        Ok(())
    }
}
