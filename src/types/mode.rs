//! Concurrency modes and parent-destruction policies.

use core::fmt;

/// How a task executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConcurrencyMode {
    /// Single-threaded cooperative execution on the runtime's driver thread.
    ///
    /// Suspension occurs only at explicit yield points; no data races by
    /// construction.
    #[default]
    Simulated,
    /// One OS-level worker thread per task, truly concurrent.
    Parallel,
}

impl ConcurrencyMode {
    /// Stable, grep-friendly name.
    #[must_use]
    pub const fn stable_name(self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Parallel => "parallel",
        }
    }
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stable_name())
    }
}

/// What happens to a child when its parent is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DestroyPolicy {
    /// Terminate the child immediately, with resource cleanup.
    #[default]
    Cascade,
    /// If the child's `keep_alive` flag is set, orphan it (parent id reset
    /// to none, daemon flag raised); otherwise cascade.
    KeepAlive,
    /// Signal the child; it observes the signal at its next cooperative
    /// checkpoint and exits cleanly.
    Graceful,
    /// Forcibly cancel the child with no cleanup guarantee beyond
    /// runtime-managed resources.
    Immediate,
}

impl DestroyPolicy {
    /// Stable, grep-friendly name.
    #[must_use]
    pub const fn stable_name(self) -> &'static str {
        match self {
            Self::Cascade => "cascade",
            Self::KeepAlive => "keep_alive",
            Self::Graceful => "graceful",
            Self::Immediate => "immediate",
        }
    }
}

impl fmt::Display for DestroyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stable_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_names() {
        assert_eq!(ConcurrencyMode::Simulated.to_string(), "simulated");
        assert_eq!(ConcurrencyMode::Parallel.to_string(), "parallel");
        assert_eq!(DestroyPolicy::Cascade.to_string(), "cascade");
        assert_eq!(DestroyPolicy::KeepAlive.to_string(), "keep_alive");
        assert_eq!(DestroyPolicy::Graceful.to_string(), "graceful");
        assert_eq!(DestroyPolicy::Immediate.to_string(), "immediate");
    }

    #[test]
    fn defaults() {
        assert_eq!(ConcurrencyMode::default(), ConcurrencyMode::Simulated);
        assert_eq!(DestroyPolicy::default(), DestroyPolicy::Cascade);
    }
}
