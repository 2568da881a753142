//! Runtime state and governance engines.
//!
//! This module contains the core runtime machinery:
//!
//! - [`clock`]: Monotonic time sources
//! - [`config`]: Runtime configuration
//! - `builder`: Runtime builder with injectable collaborators
//! - `lifecycle`: Spawn, join, termination requests, reaping
//! - `destruction`: Parent-destruction policy walks
//! - `governor`: Context-switch validation and custody transfer
//! - `tokens`: Token operations with registry preconditions
//! - `scheduler`: Cooperative driver for simulated-mode tasks
//! - `worker`: The governed worker loop shared by both modes
//! - `global`: Process-wide runtime façade

pub mod clock;
pub mod config;

mod builder;
mod destruction;
mod global;
mod governor;
mod lifecycle;
mod scheduler;
mod tokens;
mod worker;

pub use builder::RuntimeBuilder;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, RuntimeConfig};
pub use global::{init_runtime, runtime, shutdown_runtime};
pub use worker::YIELD_PERIOD;

use crate::error::{ErrorKind, Result, ResultExt};
use crate::record::{TaskShared, TaskState};
use crate::registry::TaskRegistry;
use crate::token::{Token, TokenPool};
use crate::trace::TelemetrySink;
use crate::types::{TaskId, TokenId};
use core::fmt;
use parking_lot::Mutex;
use scheduler::CoopScheduler;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use worker::WorkerEnv;

/// The governance runtime.
///
/// A `Runtime` owns the task registry, the token pool, the cooperative
/// scheduler, and the telemetry sink. Handles are cheap to clone and share
/// one underlying runtime. Exactly two governance locks exist (registry and
/// pool); when both are needed they are acquired registry-first, and no
/// governance operation holds either lock across a call into user work.
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

pub(crate) struct RuntimeInner {
    registry: Mutex<TaskRegistry>,
    pool: Arc<Mutex<TokenPool>>,
    clock: Arc<dyn Clock>,
    telemetry: Arc<dyn TelemetrySink>,
    scheduler: CoopScheduler,
    workers: Mutex<HashMap<TaskId, JoinHandle<()>>>,
}

impl Clone for Runtime {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("tasks", &self.task_count())
            .field("available_tokens", &self.available_tokens())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub(crate) fn from_parts(
        clock: Arc<dyn Clock>,
        telemetry: Arc<dyn TelemetrySink>,
        config: &RuntimeConfig,
    ) -> Result<Self> {
        let pool = Arc::new(Mutex::new(TokenPool::new()));
        let env = WorkerEnv {
            clock: Arc::clone(&clock),
            pool: Arc::clone(&pool),
            telemetry: Arc::clone(&telemetry),
        };
        let scheduler = CoopScheduler::start(env, &config.coop_thread_name)?;
        Ok(Self {
            inner: Arc::new(RuntimeInner {
                registry: Mutex::new(TaskRegistry::new()),
                pool,
                clock,
                telemetry,
                scheduler,
                workers: Mutex::new(HashMap::new()),
            }),
        })
    }

    pub(crate) fn worker_env(&self) -> WorkerEnv {
        WorkerEnv {
            clock: Arc::clone(&self.inner.clock),
            pool: Arc::clone(&self.inner.pool),
            telemetry: Arc::clone(&self.inner.telemetry),
        }
    }

    pub(crate) fn registry(&self) -> &Mutex<TaskRegistry> {
        &self.inner.registry
    }

    pub(crate) fn pool(&self) -> &Arc<Mutex<TokenPool>> {
        &self.inner.pool
    }

    pub(crate) fn scheduler(&self) -> &CoopScheduler {
        &self.inner.scheduler
    }

    pub(crate) fn workers(&self) -> &Mutex<HashMap<TaskId, JoinHandle<()>>> {
        &self.inner.workers
    }

    pub(crate) fn lookup_shared(&self, id: TaskId) -> Result<Arc<TaskShared>> {
        self.inner
            .registry
            .lock()
            .lookup(id)
            .map(|record| Arc::clone(record.shared()))
            .ok_or(ErrorKind::UnknownTask)
            .with_context(|| format!("{id}"))
    }

    /// Returns the clock driving deadlines and telemetry timestamps.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    /// Returns the telemetry sink.
    #[must_use]
    pub fn telemetry(&self) -> &Arc<dyn TelemetrySink> {
        &self.inner.telemetry
    }

    /// Returns the number of registered tasks.
    #[must_use]
    pub fn task_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// Returns the lifecycle state of a task.
    pub fn task_state(&self, id: TaskId) -> Result<TaskState> {
        Ok(self.lookup_shared(id)?.state())
    }

    /// Returns the current parent of a task (NONE once orphaned).
    pub fn parent_of(&self, id: TaskId) -> Result<TaskId> {
        Ok(self.lookup_shared(id)?.parent_id())
    }

    /// Returns the direct children of a task, ascending by id.
    #[must_use]
    pub fn children_of(&self, parent: TaskId) -> Vec<TaskId> {
        self.inner
            .registry
            .lock()
            .children_of(parent)
            .iter()
            .map(crate::record::TaskRecord::id)
            .collect()
    }

    /// Returns a task's distance from its genealogy root.
    pub fn generation_depth(&self, id: TaskId) -> Result<u32> {
        Ok(self.lookup_shared(id)?.generation_depth())
    }

    /// Returns whether the task carries the daemon flag.
    pub fn is_daemon(&self, id: TaskId) -> Result<bool> {
        Ok(self.lookup_shared(id)?.daemon_mode())
    }

    /// Returns how many context switches the task participated in.
    pub fn context_switches(&self, id: TaskId) -> Result<u64> {
        Ok(self.lookup_shared(id)?.context_switches())
    }

    /// Returns the milliseconds since the task's last cooperative
    /// checkpoint.
    pub fn heartbeat_age_ms(&self, id: TaskId) -> Result<u64> {
        let shared = self.lookup_shared(id)?;
        Ok(self.inner.clock.now().millis_since(shared.last_heartbeat()))
    }

    /// Returns a snapshot of a token slot, if the id is in range.
    #[must_use]
    pub fn token(&self, id: TokenId) -> Option<Token> {
        self.inner.pool.lock().token(id)
    }

    /// Returns the ids of tokens currently owned by a task.
    #[must_use]
    pub fn tokens_owned_by(&self, id: TaskId) -> Vec<TokenId> {
        self.inner.pool.lock().tokens_owned_by(id)
    }

    /// Returns the number of available tokens in the pool.
    #[must_use]
    pub fn available_tokens(&self) -> usize {
        self.inner.pool.lock().available()
    }

    /// Drains and reaps all tasks, then stops the cooperative driver.
    ///
    /// Running tasks receive a graceful termination request and are joined;
    /// anything still queued when the driver stops is cancelled immediately.
    pub fn shutdown(&self) {
        let ids = self.inner.registry.lock().ids();
        for &id in &ids {
            let _ = self.request_graceful(id);
        }
        for &id in &ids {
            if let Ok(shared) = self.lookup_shared(id) {
                let _ = shared.wait_terminated();
            }
        }
        for &id in &ids {
            let _ = self.reap(id);
        }
        self.inner.scheduler.shutdown();
    }
}
