//! Task record for the governance runtime.
//!
//! This module separates the *policy/state record* (pure data, safe to
//! inspect from any thread) from the *execution resource* (the OS worker or
//! scheduler slot driving it). A [`TaskRecord`] owns the immutable
//! [`TaskPolicy`] and the shared [`TaskShared`] state; it never holds thread
//! handles.

use crate::tracing_compat::{debug, trace};
use crate::types::{TaskId, TaskPolicy, TerminationCause, TerminationStatus, Time};
use core::panic::Location;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// The lifecycle state of a governed task.
///
/// `Terminated` is absorbing: no transition leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskState {
    /// Registered, worker not yet started.
    New = 0,
    /// Worker actively executing.
    Running = 1,
    /// Cooperatively suspended (simulated mode only).
    Yielded = 2,
    /// Termination underway, tokens not yet reclaimed.
    Terminating = 3,
    /// Worker returned; record retained for inspection until reaped.
    Terminated = 4,
}

impl TaskState {
    /// Returns true if this is the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Returns true if the task may issue token acquisitions.
    #[must_use]
    pub const fn can_acquire(self) -> bool {
        matches!(self, Self::New | Self::Running)
    }

    /// Returns true if the task is past the point of accepting governance
    /// requests (destruction policies skip it).
    #[must_use]
    pub const fn is_winding_down(self) -> bool {
        matches!(self, Self::Terminating | Self::Terminated)
    }

    /// Stable state name for logs and telemetry.
    #[must_use]
    pub const fn stable_name(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Running => "running",
            Self::Yielded => "yielded",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::New,
            1 => Self::Running,
            2 => Self::Yielded,
            3 => Self::Terminating,
            _ => Self::Terminated,
        }
    }
}

/// Atomic task state cell for cross-thread reads.
///
/// Transitions refuse to leave `Terminated`.
#[derive(Debug)]
pub struct TaskStateCell {
    inner: AtomicU8,
}

impl TaskStateCell {
    /// Creates a new cell initialized to the given state.
    #[must_use]
    pub fn new(state: TaskState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    /// Loads the current state.
    #[must_use]
    pub fn load(&self) -> TaskState {
        TaskState::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Attempts to transition to `next`.
    ///
    /// Returns false if the cell already holds `Terminated`.
    pub fn transition(&self, next: TaskState) -> bool {
        let mut current = self.inner.load(Ordering::Acquire);
        loop {
            if TaskState::from_u8(current).is_terminal() {
                return false;
            }
            match self.inner.compare_exchange_weak(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }
}

/// Kind of pending cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelKind {
    /// Observe at the next cooperative checkpoint and exit cleanly.
    Graceful,
    /// Honor as soon as practicable, before the next work cycle.
    Immediate,
}

impl CancelKind {
    /// The termination cause recorded when this request is honored.
    #[must_use]
    pub const fn cause(self) -> TerminationCause {
        match self {
            Self::Graceful => TerminationCause::Graceful,
            Self::Immediate => TerminationCause::Immediate,
        }
    }
}

const CANCEL_NONE: u8 = 0;
const CANCEL_GRACEFUL: u8 = 1;
const CANCEL_IMMEDIATE: u8 = 2;

/// Cross-thread governed state for one task.
///
/// Shared between the registry record, the executing worker, and governance
/// engines. Fields mutable after registration are exactly those the engines
/// govern: state, cancel request, parent id (under orphaning), daemon flag,
/// heartbeat, and statistics.
#[derive(Debug)]
pub struct TaskShared {
    id: TaskId,
    generation_depth: u32,
    creation_time: Time,
    spawn_location: &'static Location<'static>,
    state: TaskStateCell,
    cancel: AtomicU8,
    parent_id: AtomicU64,
    daemon_mode: AtomicBool,
    last_heartbeat: AtomicU64,
    work_cycles: AtomicU64,
    context_switches: AtomicU64,
    completion: Mutex<Option<TerminationCause>>,
    completion_cv: Condvar,
}

impl TaskShared {
    pub(crate) fn new(
        id: TaskId,
        parent_id: TaskId,
        daemon_mode: bool,
        generation_depth: u32,
        creation_time: Time,
        spawn_location: &'static Location<'static>,
    ) -> Self {
        Self {
            id,
            generation_depth,
            creation_time,
            spawn_location,
            state: TaskStateCell::new(TaskState::New),
            cancel: AtomicU8::new(CANCEL_NONE),
            parent_id: AtomicU64::new(parent_id.raw()),
            daemon_mode: AtomicBool::new(daemon_mode),
            last_heartbeat: AtomicU64::new(creation_time.as_nanos()),
            work_cycles: AtomicU64::new(0),
            context_switches: AtomicU64::new(0),
            completion: Mutex::new(None),
            completion_cv: Condvar::new(),
        }
    }

    /// Returns the task id.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the distance from the genealogy root, fixed at registration.
    #[must_use]
    pub const fn generation_depth(&self) -> u32 {
        self.generation_depth
    }

    /// Returns the registration timestamp.
    #[must_use]
    pub const fn creation_time(&self) -> Time {
        self.creation_time
    }

    /// Returns the source location of the spawn call.
    #[must_use]
    pub const fn spawn_location(&self) -> &'static Location<'static> {
        self.spawn_location
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.state.load()
    }

    /// Attempts a state transition; false once terminated.
    pub(crate) fn transition(&self, next: TaskState) -> bool {
        let moved = self.state.transition(next);
        if moved {
            trace!(task = %self.id, state = next.stable_name(), "task state transition");
        }
        moved
    }

    /// Returns the current parent id (NONE once orphaned).
    #[must_use]
    pub fn parent_id(&self) -> TaskId {
        TaskId::new(self.parent_id.load(Ordering::Acquire))
    }

    /// Returns the daemon flag.
    #[must_use]
    pub fn daemon_mode(&self) -> bool {
        self.daemon_mode.load(Ordering::Acquire)
    }

    /// Orphans the task: parent id becomes NONE, daemon flag is raised.
    ///
    /// Only the destruction policy engine calls this.
    pub(crate) fn orphan(&self) {
        let old_parent = self.parent_id.swap(0, Ordering::AcqRel);
        self.daemon_mode.store(true, Ordering::Release);
        debug!(task = %self.id, old_parent, "task orphaned, daemon flag raised");
    }

    /// Records a cancellation request.
    ///
    /// An immediate request strengthens a pending graceful one; a graceful
    /// request never downgrades an immediate one. Returns true if the
    /// request changed the pending kind.
    pub(crate) fn request_cancel(&self, kind: CancelKind) -> bool {
        let desired = match kind {
            CancelKind::Graceful => CANCEL_GRACEFUL,
            CancelKind::Immediate => CANCEL_IMMEDIATE,
        };
        let mut current = self.cancel.load(Ordering::Acquire);
        loop {
            if current >= desired {
                return false;
            }
            match self.cancel.compare_exchange_weak(
                current,
                desired,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    debug!(task = %self.id, kind = ?kind, "cancellation requested");
                    return true;
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Returns the pending cancellation request, if any.
    #[must_use]
    pub fn cancel_requested(&self) -> Option<CancelKind> {
        match self.cancel.load(Ordering::Acquire) {
            CANCEL_IMMEDIATE => Some(CancelKind::Immediate),
            CANCEL_GRACEFUL => Some(CancelKind::Graceful),
            _ => None,
        }
    }

    /// Updates the heartbeat to the given instant.
    pub(crate) fn heartbeat(&self, now: Time) {
        self.last_heartbeat.store(now.as_nanos(), Ordering::Release);
    }

    /// Returns the last cooperative checkpoint timestamp.
    #[must_use]
    pub fn last_heartbeat(&self) -> Time {
        Time::from_nanos(self.last_heartbeat.load(Ordering::Acquire))
    }

    /// Increments the completed work cycle counter, returning the new value.
    pub(crate) fn record_cycle(&self) -> u64 {
        self.work_cycles.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the number of completed work cycles.
    #[must_use]
    pub fn work_cycles(&self) -> u64 {
        self.work_cycles.load(Ordering::Acquire)
    }

    /// Increments the context switch counter.
    pub(crate) fn record_switch(&self) {
        self.context_switches.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the number of context switches this task participated in.
    #[must_use]
    pub fn context_switches(&self) -> u64 {
        self.context_switches.load(Ordering::Acquire)
    }

    /// Marks the task terminated with the given cause and wakes joiners.
    ///
    /// Idempotent: only the first call records a cause.
    pub(crate) fn complete(&self, cause: TerminationCause) {
        let mut slot = self.completion.lock();
        if slot.is_none() {
            debug!(
                task = %self.id,
                cause = cause.stable_name(),
                cycles = self.work_cycles(),
                "task terminated"
            );
            *slot = Some(cause);
        }
        self.state.transition(TaskState::Terminated);
        self.completion_cv.notify_all();
    }

    /// Blocks until the task reaches `Terminated`, returning its status.
    pub(crate) fn wait_terminated(&self) -> TerminationStatus {
        let mut slot = self.completion.lock();
        while slot.is_none() {
            self.completion_cv.wait(&mut slot);
        }
        let cause = slot.clone().unwrap_or(TerminationCause::Natural);
        drop(slot);
        TerminationStatus {
            cause,
            work_cycles: self.work_cycles(),
            context_switches: self.context_switches(),
        }
    }

    /// Returns the termination status without blocking, if terminated.
    #[must_use]
    pub fn status(&self) -> Option<TerminationStatus> {
        let slot = self.completion.lock();
        slot.clone().map(|cause| TerminationStatus {
            cause,
            work_cycles: self.work_cycles(),
            context_switches: self.context_switches(),
        })
    }
}

/// Registry entry for a governed task: policy plus shared state.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    policy: Arc<TaskPolicy>,
    shared: Arc<TaskShared>,
}

impl TaskRecord {
    /// Creates a record from a policy and registration-time data.
    #[must_use]
    pub fn new(
        policy: TaskPolicy,
        generation_depth: u32,
        creation_time: Time,
        spawn_location: &'static Location<'static>,
    ) -> Self {
        let shared = Arc::new(TaskShared::new(
            policy.task_id,
            policy.parent_id,
            policy.daemon_mode,
            generation_depth,
            creation_time,
            spawn_location,
        ));
        Self {
            policy: Arc::new(policy),
            shared,
        }
    }

    /// Returns the task id.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.shared.id()
    }

    /// Returns the immutable policy.
    #[must_use]
    pub fn policy(&self) -> &Arc<TaskPolicy> {
        &self.policy
    }

    /// Returns the shared governed state.
    #[must_use]
    pub fn shared(&self) -> &Arc<TaskShared> {
        &self.shared
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    /// Returns the current parent id (live view; NONE once orphaned).
    #[must_use]
    pub fn parent_id(&self) -> TaskId {
        self.shared.parent_id()
    }
}
