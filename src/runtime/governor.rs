//! Context-switch governor.
//!
//! Validates a proposed switch against the task genealogy, moves custody of
//! transferable tokens, updates statistics, and makes the target runnable.
//! A denied switch has no side effects: no tokens move and no counters
//! change.

use super::Runtime;
use crate::error::{Error, ErrorKind, Result, ResultExt};
use crate::record::TaskRecord;
use crate::trace::{TraceEvent, TraceEventKind};
use crate::tracing_compat::debug;
use crate::types::TaskId;

/// The hierarchy predicate: parent/child in either direction, or shared
/// non-root parent.
fn same_hierarchy(from: &TaskRecord, to: &TaskRecord) -> bool {
    let from_parent = from.parent_id();
    let to_parent = to.parent_id();
    from_parent == to.id()
        || to_parent == from.id()
        || (from_parent == to_parent && !from_parent.is_none())
}

impl Runtime {
    /// Validates and applies a cooperative context switch from `from` to
    /// `to`.
    ///
    /// On success every transferable token owned by `from` moves to `to`,
    /// both context-switch counters increment, and the target is made
    /// runnable. Fails with `NotSameHierarchy` when the genealogy predicate
    /// does not hold; with `RequesterNotRunnable` when either task is
    /// already terminated.
    pub fn context_switch(&self, from: TaskId, to: TaskId) -> Result<()> {
        let registry = self.registry().lock();
        let from_rec = registry
            .lookup(from)
            .cloned()
            .ok_or(ErrorKind::UnknownTask)
            .with_context(|| format!("{from}"))?;
        let to_rec = registry
            .lookup(to)
            .cloned()
            .ok_or(ErrorKind::UnknownTask)
            .with_context(|| format!("{to}"))?;

        if from_rec.state().is_terminal() || to_rec.state().is_terminal() {
            drop(registry);
            self.record_denied(from, to, ErrorKind::RequesterNotRunnable);
            return Err(Error::new(ErrorKind::RequesterNotRunnable)
                .with_context("context switch involving a terminated task"));
        }
        if !same_hierarchy(&from_rec, &to_rec) {
            drop(registry);
            self.record_denied(from, to, ErrorKind::NotSameHierarchy);
            return Err(Error::new(ErrorKind::NotSameHierarchy)
                .with_context(format!("{from} and {to} share no hierarchy")));
        }

        // Registry guard is still held: the pool lock nests inside it.
        let moved = self.pool().lock().transfer_all_owned(from, to);
        from_rec.shared().record_switch();
        to_rec.shared().record_switch();
        drop(registry);

        let now = self.clock().now();
        for token in &moved {
            self.telemetry().record(TraceEvent::ok(
                now,
                TraceEventKind::TokenTransfer,
                from,
                token.raw(),
            ));
        }
        self.telemetry()
            .record(TraceEvent::ok(now, TraceEventKind::SwitchGranted, from, to.raw()));
        debug!(from = %from, to = %to, moved = moved.len(), "context switch granted");

        // Hand the slice to the target: a yielded simulated target runs
        // next; parallel targets are already running on their own worker.
        self.scheduler().prioritize(to);
        std::thread::yield_now();
        Ok(())
    }

    fn record_denied(&self, from: TaskId, to: TaskId, kind: ErrorKind) {
        debug!(from = %from, to = %to, reason = kind.stable_name(), "context switch denied");
        self.telemetry().record(TraceEvent::failed(
            self.clock().now(),
            TraceEventKind::SwitchDenied,
            from,
            to.raw(),
            kind.stable_name(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_logging, test_runtime};
    use crate::token::{AccessMask, TokenRequest};
    use crate::types::{TaskPolicy, WorkStatus};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    // Parallel spinners stay Running between cycles, so the test body can
    // acquire tokens on their behalf without racing a cooperative yield.
    fn spawn_spinner(runtime: &Runtime, id: u64, parent: u64) -> TaskId {
        runtime
            .spawn(
                TaskPolicy::builder(id)
                    .parent(parent)
                    .mode(crate::types::ConcurrencyMode::Parallel)
                    .build(),
                || {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                    WorkStatus::Pending
                },
            )
            .expect("spawn")
    }

    #[test]
    fn siblings_may_switch_and_tokens_move() {
        init_test("siblings_may_switch_and_tokens_move");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("parent");
        let c1 = spawn_spinner(&runtime, 101, 100);
        let c2 = spawn_spinner(&runtime, 102, 100);

        let request = TokenRequest::new("shared_memory", AccessMask::READ_WRITE)
            .expect("request")
            .transferable(true);
        let token = runtime.acquire_token(c1, &request).expect("acquire");

        runtime.context_switch(c1, c2).expect("switch");

        let snapshot = runtime.token(token).expect("token");
        crate::assert_with_log!(snapshot.owner == c2, "custody moved", c2, snapshot.owner);
        assert_eq!(runtime.context_switches(c1).expect("stats"), 1);
        assert_eq!(runtime.context_switches(c2).expect("stats"), 1);
        runtime.shutdown();
        crate::test_complete!("siblings_may_switch_and_tokens_move");
    }

    #[test]
    fn parent_child_switch_is_permitted() {
        init_test("parent_child_switch_is_permitted");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("parent");
        let child = spawn_spinner(&runtime, 101, 100);

        runtime.context_switch(TaskId::new(100), child).expect("down");
        runtime.context_switch(child, TaskId::new(100)).expect("up");
        assert_eq!(runtime.context_switches(child).expect("stats"), 2);
        runtime.shutdown();
        crate::test_complete!("parent_child_switch_is_permitted");
    }

    #[test]
    fn unrelated_tasks_are_denied_without_side_effects() {
        init_test("unrelated_tasks_are_denied_without_side_effects");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("p1");
        runtime
            .spawn(TaskPolicy::builder(200).build(), || WorkStatus::Pending)
            .expect("p2");
        let c1 = spawn_spinner(&runtime, 101, 100);
        let c4 = spawn_spinner(&runtime, 201, 200);

        let request = TokenRequest::new("io", AccessMask::READ)
            .expect("request")
            .transferable(true);
        let token = runtime.acquire_token(c1, &request).expect("acquire");

        let err = runtime.context_switch(c1, c4).expect_err("denied");
        crate::assert_with_log!(
            err.kind() == ErrorKind::NotSameHierarchy,
            "denied reason",
            ErrorKind::NotSameHierarchy,
            err.kind()
        );
        assert_eq!(runtime.token(token).expect("token").owner, c1);
        assert_eq!(runtime.context_switches(c1).expect("stats"), 0);
        assert_eq!(runtime.context_switches(c4).expect("stats"), 0);
        runtime.shutdown();
        crate::test_complete!("unrelated_tasks_are_denied_without_side_effects");
    }

    #[test]
    fn non_transferable_tokens_stay_behind() {
        init_test("non_transferable_tokens_stay_behind");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("parent");
        let c1 = spawn_spinner(&runtime, 101, 100);
        let c2 = spawn_spinner(&runtime, 102, 100);

        let pinned = runtime
            .acquire_token(
                c1,
                &TokenRequest::new("pinned", AccessMask::WRITE).expect("request"),
            )
            .expect("acquire");
        let movable = runtime
            .acquire_token(
                c1,
                &TokenRequest::new("movable", AccessMask::READ)
                    .expect("request")
                    .transferable(true),
            )
            .expect("acquire");

        runtime.context_switch(c1, c2).expect("switch");
        assert_eq!(runtime.token(pinned).expect("token").owner, c1);
        assert_eq!(runtime.token(movable).expect("token").owner, c2);
        runtime.shutdown();
        crate::test_complete!("non_transferable_tokens_stay_behind");
    }

    #[test]
    fn terminated_participant_is_rejected() {
        init_test("terminated_participant_is_rejected");
        let (runtime, _clock) = test_runtime();
        runtime
            .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
            .expect("parent");
        let c1 = spawn_spinner(&runtime, 101, 100);
        let c2 = runtime
            .spawn(
                TaskPolicy::builder(102).parent(100).build(),
                || WorkStatus::Complete,
            )
            .expect("spawn");
        runtime.join(c2).expect("join");

        let err = runtime.context_switch(c1, c2).expect_err("rejected");
        assert_eq!(err.kind(), ErrorKind::RequesterNotRunnable);
        runtime.shutdown();
        crate::test_complete!("terminated_participant_is_rejected");
    }
}
