//! Process-wide runtime façade.
//!
//! Embedders that want a single shared runtime initialize it once with
//! [`init_runtime`], obtain handles with [`runtime`], and tear it down with
//! [`shutdown_runtime`]. Libraries and tests should prefer constructing
//! isolated runtimes through [`crate::runtime::RuntimeBuilder`].

use super::builder::RuntimeBuilder;
use super::Runtime;
use crate::error::{Error, ErrorKind, Result};
use crate::tracing_compat::info;
use parking_lot::Mutex;

static GLOBAL: Mutex<Option<Runtime>> = Mutex::new(None);

/// Initializes the process-wide runtime with default collaborators.
///
/// Fails with `AlreadyInitialized` if a global runtime exists.
pub fn init_runtime() -> Result<()> {
    let mut slot = GLOBAL.lock();
    if slot.is_some() {
        return Err(Error::new(ErrorKind::AlreadyInitialized));
    }
    let runtime = RuntimeBuilder::new().build()?;
    *slot = Some(runtime);
    info!("global runtime initialized");
    Ok(())
}

/// Returns a handle to the process-wide runtime.
pub fn runtime() -> Result<Runtime> {
    GLOBAL
        .lock()
        .clone()
        .ok_or_else(|| Error::new(ErrorKind::NotInitialized))
}

/// Drains and reaps all tasks, stops the driver, and clears the global
/// runtime.
pub fn shutdown_runtime() -> Result<()> {
    let runtime = GLOBAL
        .lock()
        .take()
        .ok_or_else(|| Error::new(ErrorKind::NotInitialized))?;
    runtime.shutdown();
    info!("global runtime shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use crate::types::{TaskId, TaskPolicy, WorkStatus};

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    // Global state: exercise the full façade lifecycle in one test to keep
    // test-order independence.
    #[test]
    fn global_lifecycle() {
        init_test("global_lifecycle");
        let err = runtime().expect_err("not yet initialized");
        assert_eq!(err.kind(), ErrorKind::NotInitialized);
        let err = shutdown_runtime().expect_err("not yet initialized");
        assert_eq!(err.kind(), ErrorKind::NotInitialized);

        init_runtime().expect("first init");
        let err = init_runtime().expect_err("second init");
        crate::assert_with_log!(
            err.kind() == ErrorKind::AlreadyInitialized,
            "double init rejected",
            ErrorKind::AlreadyInitialized,
            err.kind()
        );

        let handle = runtime().expect("handle");
        let id = handle
            .spawn(TaskPolicy::builder(TaskId::generate()).build(), || {
                WorkStatus::Complete
            })
            .expect("spawn");
        handle.join(id).expect("join");

        shutdown_runtime().expect("shutdown");
        let err = runtime().expect_err("cleared");
        assert_eq!(err.kind(), ErrorKind::NotInitialized);

        // The façade accepts re-initialization after a clean shutdown.
        init_runtime().expect("re-init");
        shutdown_runtime().expect("final shutdown");
        crate::test_complete!("global_lifecycle");
    }
}
