//! The immutable per-task governance policy.
//!
//! A [`TaskPolicy`] is submitted with the work object at spawn time and is
//! immutable once the task is registered. The two governed-mutable fields of
//! the conceptual policy record (`parent_id`, `daemon_mode`) live in the
//! task's shared state, where the destruction policy engine may clear them;
//! this struct carries only their initial values.

use super::id::TaskId;
use super::mode::{ConcurrencyMode, DestroyPolicy};

/// Immutable governance policy for a single task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPolicy {
    /// Unique task id, assigned before registration.
    pub task_id: TaskId,
    /// Parent task id, or [`TaskId::NONE`] for a root task.
    pub parent_id: TaskId,
    /// Execution mode.
    pub mode: ConcurrencyMode,
    /// What happens to this task when its parent is destroyed.
    pub destroy_policy: DestroyPolicy,
    /// Consulted only under [`DestroyPolicy::KeepAlive`].
    pub keep_alive: bool,
    /// Initial daemon flag; a daemon survives parent orphaning.
    pub daemon_mode: bool,
    /// Whether generation-depth enforcement is active.
    pub trace_capped: bool,
    /// If capped, the task terminates when its genealogical depth exceeds
    /// this value.
    pub max_trace_depth: u32,
    /// Execution time limit in milliseconds; 0 means no limit.
    pub max_execution_time_ms: u64,
    /// In simulated mode, the task must periodically yield to the driver.
    pub return_to_main_required: bool,
}

impl TaskPolicy {
    /// Starts building a policy for the given task id.
    #[must_use]
    pub fn builder(task_id: impl Into<TaskId>) -> TaskPolicyBuilder {
        TaskPolicyBuilder::new(task_id.into())
    }
}

/// Builder for [`TaskPolicy`].
///
/// Defaults: no parent, simulated mode, cascade destruction, no keep-alive,
/// no daemon flag, no trace cap, no execution limit, yielding required.
#[derive(Debug, Clone)]
pub struct TaskPolicyBuilder {
    policy: TaskPolicy,
}

impl TaskPolicyBuilder {
    /// Creates a builder with defaults for the given task id.
    #[must_use]
    pub fn new(task_id: TaskId) -> Self {
        Self {
            policy: TaskPolicy {
                task_id,
                parent_id: TaskId::NONE,
                mode: ConcurrencyMode::default(),
                destroy_policy: DestroyPolicy::default(),
                keep_alive: false,
                daemon_mode: false,
                trace_capped: false,
                max_trace_depth: 0,
                max_execution_time_ms: 0,
                return_to_main_required: true,
            },
        }
    }

    /// Sets the parent task id.
    #[must_use]
    pub fn parent(mut self, parent_id: impl Into<TaskId>) -> Self {
        self.policy.parent_id = parent_id.into();
        self
    }

    /// Sets the execution mode.
    #[must_use]
    pub const fn mode(mut self, mode: ConcurrencyMode) -> Self {
        self.policy.mode = mode;
        self
    }

    /// Sets the destruction policy.
    #[must_use]
    pub const fn destroy_policy(mut self, policy: DestroyPolicy) -> Self {
        self.policy.destroy_policy = policy;
        self
    }

    /// Sets the keep-alive flag (consulted under `KeepAlive`).
    #[must_use]
    pub const fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.policy.keep_alive = keep_alive;
        self
    }

    /// Sets the initial daemon flag.
    #[must_use]
    pub const fn daemon(mut self, daemon: bool) -> Self {
        self.policy.daemon_mode = daemon;
        self
    }

    /// Enables generation-depth enforcement with the given cap.
    #[must_use]
    pub const fn trace_cap(mut self, max_depth: u32) -> Self {
        self.policy.trace_capped = true;
        self.policy.max_trace_depth = max_depth;
        self
    }

    /// Sets the execution time limit in milliseconds (0 = unlimited).
    #[must_use]
    pub const fn max_execution_time_ms(mut self, millis: u64) -> Self {
        self.policy.max_execution_time_ms = millis;
        self
    }

    /// Sets whether the task must periodically yield in simulated mode.
    #[must_use]
    pub const fn return_to_main(mut self, required: bool) -> Self {
        self.policy.return_to_main_required = required;
        self
    }

    /// Finishes the builder.
    #[must_use]
    pub fn build(self) -> TaskPolicy {
        self.policy
    }
}
