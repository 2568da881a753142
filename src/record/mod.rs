//! Internal records for governed tasks.

pub mod task;

pub use task::{CancelKind, TaskRecord, TaskShared, TaskState, TaskStateCell};
