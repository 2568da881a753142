//! Cooperative scheduler for simulated-mode tasks.
//!
//! All simulated tasks execute on a single driver thread. The run queue is
//! FIFO in registration order; a task that yields goes to the back, and a
//! context-switch target is moved to the front so it becomes runnable next.
//! Suspension happens only at the explicit yield points of the worker loop,
//! so simulated tasks are race-free by construction.

use super::worker::{self, GovernedTask, Slice, WorkerEnv};
use crate::error::{Error, ErrorKind, Result};
use crate::tracing_compat::{debug, trace};
use crate::types::TaskId;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

struct SchedulerShared {
    queue: Mutex<VecDeque<GovernedTask>>,
    available: Condvar,
    shutting_down: AtomicBool,
}

/// Single-threaded cooperative driver.
pub(crate) struct CoopScheduler {
    shared: Arc<SchedulerShared>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl CoopScheduler {
    /// Starts the driver thread.
    pub fn start(env: WorkerEnv, thread_name: &str) -> Result<Self> {
        let shared = Arc::new(SchedulerShared {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            shutting_down: AtomicBool::new(false),
        });
        let driver_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || drive(&driver_shared, &env))
            .map_err(|e| {
                Error::new(ErrorKind::Internal)
                    .with_context(format!("failed to start driver thread: {e}"))
            })?;
        Ok(Self {
            shared,
            driver: Mutex::new(Some(handle)),
        })
    }

    /// Enqueues a task at the back of the run queue.
    pub fn enqueue(&self, task: GovernedTask) {
        let mut queue = self.shared.queue.lock();
        trace!(task = %task.shared.id(), depth = queue.len(), "task enqueued");
        queue.push_back(task);
        drop(queue);
        self.shared.available.notify_one();
    }

    /// Moves a queued task to the front of the run queue.
    ///
    /// Returns true if the task was queued. Used to make a context-switch
    /// target runnable next and to hasten cancellation observation.
    pub fn prioritize(&self, id: TaskId) -> bool {
        let mut queue = self.shared.queue.lock();
        let Some(position) = queue.iter().position(|t| t.shared.id() == id) else {
            return false;
        };
        if position > 0 {
            if let Some(task) = queue.remove(position) {
                queue.push_front(task);
            }
        }
        drop(queue);
        self.shared.available.notify_one();
        true
    }

    /// Stops the driver once the queue drains and joins it.
    pub fn shutdown(&self) {
        self.shared.shutting_down.store(true, Ordering::Release);
        self.shared.available.notify_all();
        let handle = self.driver.lock().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        debug!("cooperative scheduler stopped");
    }
}

fn drive(shared: &Arc<SchedulerShared>, env: &WorkerEnv) {
    loop {
        let mut task = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(task) = queue.pop_front() {
                    break task;
                }
                if shared.shutting_down.load(Ordering::Acquire) {
                    return;
                }
                shared.available.wait(&mut queue);
            }
        };

        if shared.shutting_down.load(Ordering::Acquire) {
            task.shared
                .request_cancel(crate::record::CancelKind::Immediate);
        }

        match worker::run_slice(&mut task, env) {
            Slice::Yielded => {
                let mut queue = shared.queue.lock();
                queue.push_back(task);
            }
            Slice::Finished(cause) => {
                worker::finalize(&task.shared, env, cause);
            }
        }
    }
}
