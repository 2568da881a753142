//! Parent-destruction policy engine.
//!
//! Invoked after a parent has reached `Terminated`. Walks the parent's
//! direct children in ascending task-id order and applies each child's
//! declared policy. Grandchildren are handled only when their own parent
//! terminates; the walk never reaches past one generation.

use super::Runtime;
use crate::error::Result;
use crate::trace::{TraceEvent, TraceEventKind};
use crate::tracing_compat::debug;
use crate::types::{DestroyPolicy, TaskId};

impl Runtime {
    /// Applies destruction policies to the direct children of `parent_id`.
    ///
    /// Children already winding down are skipped. Returns the number of
    /// affected children.
    pub fn on_parent_destroyed(&self, parent_id: TaskId) -> Result<usize> {
        let children = self.registry().lock().children_of(parent_id);
        let mut affected = 0;

        for child in children {
            if child.state().is_winding_down() {
                continue;
            }
            let id = child.id();
            match child.policy().destroy_policy {
                DestroyPolicy::Cascade => {
                    debug!(parent = %parent_id, child = %id, "cascading destruction");
                    self.request_immediate(id)?;
                }
                DestroyPolicy::KeepAlive => {
                    if child.policy().keep_alive {
                        debug!(parent = %parent_id, child = %id, "keep-alive granted, orphaning");
                        child.shared().orphan();
                        self.telemetry().record(TraceEvent::ok(
                            self.clock().now(),
                            TraceEventKind::Orphaned,
                            id,
                            parent_id.raw(),
                        ));
                    } else {
                        debug!(parent = %parent_id, child = %id, "keep-alive denied, terminating");
                        self.request_immediate(id)?;
                    }
                }
                DestroyPolicy::Graceful => {
                    debug!(parent = %parent_id, child = %id, "graceful shutdown requested");
                    self.request_graceful(id)?;
                }
                DestroyPolicy::Immediate => {
                    debug!(parent = %parent_id, child = %id, "immediate termination");
                    self.request_immediate(id)?;
                }
            }
            affected += 1;
        }

        self.telemetry().record(TraceEvent::ok(
            self.clock().now(),
            TraceEventKind::ParentDestroyed,
            parent_id,
            affected as u64,
        ));
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TaskState;
    use crate::test_utils::{init_test_logging, test_runtime};
    use crate::types::{TaskPolicy, TerminationCause, WorkStatus};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    fn spinning(runtime: &Runtime, id: u64, parent: u64, policy: DestroyPolicy, keep: bool) {
        runtime
            .spawn(
                TaskPolicy::builder(id)
                    .parent(parent)
                    .destroy_policy(policy)
                    .keep_alive(keep)
                    .build(),
                || WorkStatus::Pending,
            )
            .expect("spawn child");
    }

    fn terminate(runtime: &Runtime, id: u64) {
        runtime.request_graceful(TaskId::new(id)).expect("request");
        runtime.join(TaskId::new(id)).expect("join");
    }

    #[test]
    fn cascade_terminates_child() {
        init_test("cascade_terminates_child");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("spawn parent");
        spinning(&runtime, 101, 100, DestroyPolicy::Cascade, false);

        terminate(&runtime, 100);
        let affected = runtime
            .on_parent_destroyed(TaskId::new(100))
            .expect("destroy walk");
        assert_eq!(affected, 1);

        let status = runtime.join(TaskId::new(101)).expect("join child");
        assert_eq!(status.cause, TerminationCause::Immediate);
        assert!(runtime.tokens_owned_by(TaskId::new(101)).is_empty());
        runtime.shutdown();
        crate::test_complete!("cascade_terminates_child");
    }

    #[test]
    fn keep_alive_orphans_daemon() {
        init_test("keep_alive_orphans_daemon");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("spawn parent");
        spinning(&runtime, 102, 100, DestroyPolicy::KeepAlive, true);

        terminate(&runtime, 100);
        runtime
            .on_parent_destroyed(TaskId::new(100))
            .expect("destroy walk");

        let state = runtime.task_state(TaskId::new(102)).expect("state");
        crate::assert_with_log!(
            !state.is_winding_down(),
            "orphan still alive",
            false,
            state.is_winding_down()
        );
        assert_eq!(runtime.parent_of(TaskId::new(102)).expect("parent"), TaskId::NONE);
        assert!(runtime.is_daemon(TaskId::new(102)).expect("daemon"));
        assert!(runtime.children_of(TaskId::new(100)).is_empty());
        runtime.shutdown();
        crate::test_complete!("keep_alive_orphans_daemon");
    }

    #[test]
    fn keep_alive_denied_falls_back_to_immediate() {
        init_test("keep_alive_denied_falls_back_to_immediate");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("spawn parent");
        spinning(&runtime, 103, 100, DestroyPolicy::KeepAlive, false);

        terminate(&runtime, 100);
        runtime
            .on_parent_destroyed(TaskId::new(100))
            .expect("destroy walk");
        let status = runtime.join(TaskId::new(103)).expect("join child");
        assert_eq!(status.cause, TerminationCause::Immediate);
        runtime.shutdown();
        crate::test_complete!("keep_alive_denied_falls_back_to_immediate");
    }

    #[test]
    fn graceful_child_exits_at_checkpoint() {
        init_test("graceful_child_exits_at_checkpoint");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("spawn parent");
        let cycles = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let child_cycles = std::sync::Arc::clone(&cycles);
        runtime
            .spawn(
                TaskPolicy::builder(104)
                    .parent(100)
                    .destroy_policy(DestroyPolicy::Graceful)
                    .build(),
                move || {
                    child_cycles.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    WorkStatus::Pending
                },
            )
            .expect("spawn child");
        while cycles.load(std::sync::atomic::Ordering::SeqCst) == 0 {
            std::thread::yield_now();
        }

        terminate(&runtime, 100);
        runtime
            .on_parent_destroyed(TaskId::new(100))
            .expect("destroy walk");
        let status = runtime.join(TaskId::new(104)).expect("join child");
        assert_eq!(status.cause, TerminationCause::Graceful);
        assert!(status.work_cycles >= 1);
        runtime.shutdown();
        crate::test_complete!("graceful_child_exits_at_checkpoint");
    }

    #[test]
    fn already_terminated_children_are_skipped() {
        init_test("already_terminated_children_are_skipped");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("spawn parent");
        runtime
            .spawn(
                TaskPolicy::builder(105).parent(100).build(),
                || WorkStatus::Complete,
            )
            .expect("spawn child");
        runtime.join(TaskId::new(105)).expect("join child");

        terminate(&runtime, 100);
        let affected = runtime
            .on_parent_destroyed(TaskId::new(100))
            .expect("destroy walk");
        crate::assert_with_log!(affected == 0, "terminated child skipped", 0usize, affected);
        assert_eq!(
            runtime.task_state(TaskId::new(105)).expect("state"),
            TaskState::Terminated
        );
        runtime.shutdown();
        crate::test_complete!("already_terminated_children_are_skipped");
    }

    #[test]
    fn destruction_walk_is_one_generation_deep() {
        init_test("destruction_walk_is_one_generation_deep");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("parent");
        spinning(&runtime, 110, 100, DestroyPolicy::Cascade, false);
        spinning(&runtime, 120, 110, DestroyPolicy::Cascade, false);

        terminate(&runtime, 100);
        let affected = runtime
            .on_parent_destroyed(TaskId::new(100))
            .expect("destroy walk");
        assert_eq!(affected, 1);

        runtime.join(TaskId::new(110)).expect("join child");
        // The grandchild is untouched until its own parent's walk runs.
        let state = runtime.task_state(TaskId::new(120)).expect("state");
        assert!(!state.is_winding_down());

        let affected = runtime
            .on_parent_destroyed(TaskId::new(110))
            .expect("grandchild walk");
        assert_eq!(affected, 1);
        runtime.join(TaskId::new(120)).expect("join grandchild");
        runtime.shutdown();
        crate::test_complete!("destruction_walk_is_one_generation_deep");
    }
}
