//! Telemetry events and data types.
//!
//! Each event represents an observable governance action: a lifecycle
//! transition, a token operation, or a context-switch decision.

use crate::types::{TaskId, Time};
use core::fmt;
use serde::Serialize;

/// The kind of telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TraceEventKind {
    /// A task was registered and its worker created.
    Spawn,
    /// A worker began executing.
    Start,
    /// A task cooperatively suspended.
    Yield,
    /// A suspended task resumed.
    Resume,
    /// A graceful or immediate termination request was recorded.
    CancelRequest,
    /// A task began winding down (tokens not yet reclaimed).
    Terminating,
    /// A task reached its terminal state.
    Terminated,
    /// A terminated task was removed from the registry.
    Reap,
    /// A child was orphaned under a keep-alive policy.
    Orphaned,
    /// A parent-destruction walk completed.
    ParentDestroyed,
    /// A token acquisition was attempted.
    TokenAcquire,
    /// A token was released.
    TokenRelease,
    /// A single token changed custody.
    TokenTransfer,
    /// A terminating task's tokens were reclaimed.
    TokenReclaim,
    /// A context switch was validated and applied.
    SwitchGranted,
    /// A context switch was denied.
    SwitchDenied,
}

impl TraceEventKind {
    /// Canonical list of all event kinds.
    pub const ALL: [Self; 16] = [
        Self::Spawn,
        Self::Start,
        Self::Yield,
        Self::Resume,
        Self::CancelRequest,
        Self::Terminating,
        Self::Terminated,
        Self::Reap,
        Self::Orphaned,
        Self::ParentDestroyed,
        Self::TokenAcquire,
        Self::TokenRelease,
        Self::TokenTransfer,
        Self::TokenReclaim,
        Self::SwitchGranted,
        Self::SwitchDenied,
    ];

    /// Stable, grep-friendly taxonomy name.
    #[must_use]
    pub const fn stable_name(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::Start => "start",
            Self::Yield => "yield",
            Self::Resume => "resume",
            Self::CancelRequest => "cancel_request",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
            Self::Reap => "reap",
            Self::Orphaned => "orphaned",
            Self::ParentDestroyed => "parent_destroyed",
            Self::TokenAcquire => "token_acquire",
            Self::TokenRelease => "token_release",
            Self::TokenTransfer => "token_transfer",
            Self::TokenReclaim => "token_reclaim",
            Self::SwitchGranted => "switch_granted",
            Self::SwitchDenied => "switch_denied",
        }
    }
}

impl fmt::Display for TraceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stable_name())
    }
}

/// One telemetry record.
///
/// `other` carries the secondary id for the event kind: the token id for
/// token operations, the peer task for switches and transfers, the parent
/// for spawn/orphan events, and the affected-child count for
/// [`TraceEventKind::ParentDestroyed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    /// Monotonic timestamp.
    pub at: Time,
    /// Event kind.
    pub kind: TraceEventKind,
    /// Primary task id.
    pub task: TaskId,
    /// Secondary id (token, parent, peer, or count).
    pub other: u64,
    /// Outcome: `"ok"`, a stable error name, or (for
    /// [`TraceEventKind::Terminated`]) the termination cause name.
    pub outcome: &'static str,
}

impl TraceEvent {
    /// Creates a successful event.
    #[must_use]
    pub const fn ok(at: Time, kind: TraceEventKind, task: TaskId, other: u64) -> Self {
        Self {
            at,
            kind,
            task,
            other,
            outcome: "ok",
        }
    }

    /// Creates a failed event with a stable outcome name.
    #[must_use]
    pub const fn failed(
        at: Time,
        kind: TraceEventKind,
        task: TaskId,
        other: u64,
        outcome: &'static str,
    ) -> Self {
        Self {
            at,
            kind,
            task,
            other,
            outcome,
        }
    }

    /// Returns true if the recorded operation succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.outcome == "ok"
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} task={} other={} outcome={}",
            self.at, self.kind, self.task, self.other, self.outcome
        )
    }
}
