#![allow(missing_docs)]
//! Structural limits and termination-cause round trips.

mod common;

use common::*;
use std::sync::Arc;
use warden::trace::TraceEventKind;
use warden::types::{ConcurrencyMode, TaskId, TaskPolicy, TerminationCause, WorkStatus};
use warden::{ErrorKind, MAX_CHILDREN_PER_PROCESS, MAX_HIERARCHY_DEPTH, YIELD_PERIOD};

#[test]
fn hierarchy_depth_boundary() {
    init_test("hierarchy_depth_boundary");
    let (runtime, _clock) = test_runtime();
    runtime
        .spawn(TaskPolicy::builder(1).build(), || WorkStatus::Pending)
        .expect("root");
    for depth in 1..=u64::from(MAX_HIERARCHY_DEPTH) {
        spawn_spinner(&runtime, depth + 1, depth);
    }
    assert_eq!(
        runtime
            .generation_depth(TaskId::new(u64::from(MAX_HIERARCHY_DEPTH) + 1))
            .expect("depth"),
        MAX_HIERARCHY_DEPTH
    );

    let err = runtime
        .spawn(
            TaskPolicy::builder(1000)
                .parent(u64::from(MAX_HIERARCHY_DEPTH) + 1)
                .build(),
            || WorkStatus::Pending,
        )
        .expect_err("depth 9 must fail");
    assert_with_log!(
        err.kind() == ErrorKind::HierarchyDepthExceeded,
        "depth boundary",
        ErrorKind::HierarchyDepthExceeded,
        err.kind()
    );
    runtime.shutdown();
    test_complete!("hierarchy_depth_boundary");
}

#[test]
fn child_limit_boundary() {
    init_test("child_limit_boundary");
    let (runtime, _clock) = test_runtime();
    runtime
        .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
        .expect("parent");
    for i in 0..MAX_CHILDREN_PER_PROCESS as u64 {
        spawn_spinner(&runtime, 200 + i, 100);
    }
    let err = runtime
        .spawn(
            TaskPolicy::builder(500).parent(100).build(),
            || WorkStatus::Pending,
        )
        .expect_err("33rd child must fail");
    assert_with_log!(
        err.kind() == ErrorKind::ChildLimitExceeded,
        "child boundary",
        ErrorKind::ChildLimitExceeded,
        err.kind()
    );
    runtime.shutdown();
    test_complete!("child_limit_boundary");
}

#[test]
fn deadline_terminates_within_one_cycle_window() {
    init_test("deadline_terminates_within_one_cycle_window");
    let (runtime, clock) = test_runtime();
    let driver = Arc::clone(&clock);
    let id = runtime
        .spawn(
            TaskPolicy::builder(100).max_execution_time_ms(1).build(),
            move || {
                driver.advance_millis(2);
                WorkStatus::Pending
            },
        )
        .expect("spawn");
    let status = runtime.join(id).expect("join");
    assert_eq!(status.cause, TerminationCause::Deadline);
    assert_with_log!(
        status.work_cycles == 1,
        "one cycle window",
        1u64,
        status.work_cycles
    );
    runtime.shutdown();
    test_complete!("deadline_terminates_within_one_cycle_window");
}

#[test]
fn trace_cap_round_trip() {
    init_test("trace_cap_round_trip");
    let (runtime, _clock) = test_runtime();
    runtime
        .spawn(TaskPolicy::builder(100).build(), || WorkStatus::Pending)
        .expect("parent");
    let id = runtime
        .spawn(
            TaskPolicy::builder(101).parent(100).trace_cap(0).build(),
            || WorkStatus::Pending,
        )
        .expect("spawn capped child");
    let status = runtime.join(id).expect("join");
    assert_eq!(status.cause, TerminationCause::TraceCap);
    runtime.shutdown();
    test_complete!("trace_cap_round_trip");
}

#[test]
fn every_termination_cause_round_trips_through_join() {
    init_test("every_termination_cause_round_trips_through_join");
    let (runtime, _clock) = test_runtime();

    let natural = runtime
        .spawn(TaskPolicy::builder(1).build(), || WorkStatus::Complete)
        .expect("spawn");
    assert_eq!(
        runtime.join(natural).expect("join").cause,
        TerminationCause::Natural
    );

    let graceful = spawn_spinner(&runtime, 2, 0);
    runtime.request_graceful(graceful).expect("request");
    assert_eq!(
        runtime.join(graceful).expect("join").cause,
        TerminationCause::Graceful
    );

    let immediate = spawn_spinner(&runtime, 3, 0);
    runtime.request_immediate(immediate).expect("request");
    assert_eq!(
        runtime.join(immediate).expect("join").cause,
        TerminationCause::Immediate
    );

    let fault = runtime
        .spawn(TaskPolicy::builder(4).build(), || -> WorkStatus {
            panic!("intentional fault")
        })
        .expect("spawn");
    let status = runtime.join(fault).expect("join");
    assert_with_log!(status.is_fault(), "fault cause", true, status.is_fault());
    runtime.shutdown();
    test_complete!("every_termination_cause_round_trips_through_join");
}

#[test]
fn parallel_and_simulated_share_one_policy_surface() {
    init_test("parallel_and_simulated_share_one_policy_surface");
    let (runtime, _clock) = test_runtime();
    let mut ids = Vec::new();
    for i in 0..4u64 {
        let mode = if i % 2 == 0 {
            ConcurrencyMode::Simulated
        } else {
            ConcurrencyMode::Parallel
        };
        let mut cycles = 0u64;
        let id = runtime
            .spawn(TaskPolicy::builder(10 + i).mode(mode).build(), move || {
                cycles += 1;
                if cycles >= 15 {
                    WorkStatus::Complete
                } else {
                    WorkStatus::Pending
                }
            })
            .expect("spawn");
        ids.push(id);
    }
    for id in ids {
        let status = runtime.join(id).expect("join");
        assert_eq!(status.cause, TerminationCause::Natural);
        assert_eq!(status.work_cycles, 15);
    }
    runtime.shutdown();
    test_complete!("parallel_and_simulated_share_one_policy_surface");
}

#[test]
fn per_task_telemetry_is_totally_ordered() {
    init_test("per_task_telemetry_is_totally_ordered");
    let (runtime, _clock, telemetry) = test_runtime_with_telemetry();
    let mut cycles = 0u64;
    let id = runtime
        .spawn(TaskPolicy::builder(100).build(), move || {
            cycles += 1;
            if cycles >= YIELD_PERIOD + 1 {
                WorkStatus::Complete
            } else {
                WorkStatus::Pending
            }
        })
        .expect("spawn");
    runtime.join(id).expect("join");

    let kinds: Vec<TraceEventKind> = telemetry
        .snapshot()
        .iter()
        .filter(|e| e.task == id)
        .map(|e| e.kind)
        .collect();
    let position = |kind: TraceEventKind| kinds.iter().position(|&k| k == kind);

    let spawn = position(TraceEventKind::Spawn).expect("spawn event");
    let start = position(TraceEventKind::Start).expect("start event");
    let yielded = position(TraceEventKind::Yield).expect("yield event");
    let resumed = position(TraceEventKind::Resume).expect("resume event");
    let terminated = position(TraceEventKind::Terminated).expect("terminated event");
    assert!(spawn < start && start < yielded && yielded < resumed && resumed < terminated);
    runtime.shutdown();
    test_complete!("per_task_telemetry_is_totally_ordered");
}

#[test]
fn heartbeat_age_tracks_checkpoints() {
    init_test("heartbeat_age_tracks_checkpoints");
    let (runtime, clock) = test_runtime();
    let id = spawn_spinner(&runtime, 100, 0);
    // Let the spinner reach at least one checkpoint.
    std::thread::sleep(std::time::Duration::from_millis(20));
    clock.advance_millis(7);
    let age = runtime.heartbeat_age_ms(id).expect("age");
    assert_with_log!(age <= 7, "heartbeat age bounded by advance", "<= 7", age);
    drain(&runtime, id);
    runtime.shutdown();
    test_complete!("heartbeat_age_tracks_checkpoints");
}
