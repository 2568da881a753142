//! Error types and error handling strategy for Warden.
//!
//! This module defines the core error types used throughout the runtime.
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Structural and misuse errors are returned to the caller immediately and
//!   never retried by the runtime
//! - A worker fault terminates only the offending task and is surfaced on
//!   join and in telemetry

use core::fmt;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Token pool ===
    /// Token pool has no free slot.
    PoolExhausted,
    /// Token id is out of range.
    UnknownToken,
    /// Token is not owned (or not owned by the stated task).
    NotOwned,
    /// Token is pinned to its owner and cannot be transferred.
    NotTransferable,
    /// Resource name exceeds the permitted length.
    InvalidName,

    // === Registry / genealogy ===
    /// Task id not present in the registry.
    UnknownTask,
    /// Task id was already used during this process lifetime.
    DuplicateTask,
    /// Task exists but is not in a state that permits the operation.
    RequesterNotRunnable,
    /// Registration would exceed the maximum hierarchy depth.
    HierarchyDepthExceeded,
    /// Parent already has the maximum number of direct children.
    ChildLimitExceeded,
    /// Registry is at capacity.
    RegistryFull,

    // === Context switch ===
    /// The two tasks are not in the same governance hierarchy.
    NotSameHierarchy,

    // === Lifecycle ===
    /// The worker aborted inside its work function.
    WorkerFault,

    // === Runtime lifecycle ===
    /// The global runtime was already initialized.
    AlreadyInitialized,
    /// The global runtime has not been initialized.
    NotInitialized,

    // === Internal ===
    /// Internal runtime error (bug).
    Internal,
}

impl ErrorKind {
    /// Stable, grep-friendly name for telemetry and logs.
    #[must_use]
    pub const fn stable_name(self) -> &'static str {
        match self {
            Self::PoolExhausted => "pool_exhausted",
            Self::UnknownToken => "unknown_token",
            Self::NotOwned => "not_owned",
            Self::NotTransferable => "not_transferable",
            Self::InvalidName => "invalid_name",
            Self::UnknownTask => "unknown_task",
            Self::DuplicateTask => "duplicate_task",
            Self::RequesterNotRunnable => "requester_not_runnable",
            Self::HierarchyDepthExceeded => "hierarchy_depth_exceeded",
            Self::ChildLimitExceeded => "child_limit_exceeded",
            Self::RegistryFull => "registry_full",
            Self::NotSameHierarchy => "not_same_hierarchy",
            Self::WorkerFault => "worker_fault",
            Self::AlreadyInitialized => "already_initialized",
            Self::NotInitialized => "not_initialized",
            Self::Internal => "internal",
        }
    }
}

/// The main error type for Warden operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    context: Option<String>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error denies a context switch.
    #[must_use]
    pub const fn is_denied_switch(&self) -> bool {
        matches!(self.kind, ErrorKind::NotSameHierarchy)
    }

    /// Returns true if this error reports a structural limit.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::HierarchyDepthExceeded
                | ErrorKind::ChildLimitExceeded
                | ErrorKind::RegistryFull
        )
    }

    /// Adds deterministic context text to the error.
    #[must_use]
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context = Some(ctx.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(ctx) = &self.context {
            write!(f, ": {ctx}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Attach a context string on error.
    fn context(self, ctx: impl Into<String>) -> Result<T>;
    /// Attach context computed lazily on error.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for core::result::Result<T, E> {
    fn context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(ctx))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

/// A specialized Result type for Warden operations.
pub type Result<T> = core::result::Result<T, Error>;
