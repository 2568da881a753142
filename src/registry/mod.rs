//! Process-wide task registry with genealogy lookup.
//!
//! The registry maps task ids to [`TaskRecord`]s and enforces the structural
//! invariants of the genealogy at registration time: hierarchy depth, direct
//! child limits, capacity, and id uniqueness across the process lifetime.
//!
//! The registry itself is a plain data structure; the runtime serializes
//! access through a single lock, acquired before the token pool lock
//! whenever both are needed. Callers only use [`TaskRegistry::children_of`]
//! for genealogy queries, so a secondary parent index can be introduced
//! without changing the API.

use crate::error::{Error, ErrorKind, Result, ResultExt};
use crate::record::TaskRecord;
use crate::tracing_compat::debug;
use crate::types::{TaskId, TaskPolicy, Time};
use core::panic::Location;
use std::collections::{HashMap, HashSet};

/// Maximum number of registered tasks.
pub const MAX_TASKS: usize = 256;

/// Maximum genealogical depth; a root task has depth 0.
pub const MAX_HIERARCHY_DEPTH: u32 = 8;

/// Maximum simultaneous direct children of one parent.
pub const MAX_CHILDREN_PER_PROCESS: usize = 32;

/// Mapping from task id to task record.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskId, TaskRecord>,
    retired: HashSet<TaskId>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no tasks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Registers a task under the given policy.
    ///
    /// Computes the generation depth from the parent, enforces the depth
    /// cap, the per-parent child limit, registry capacity, and id
    /// uniqueness across the process lifetime. On success the constructed
    /// record is returned (a cheap handle; the registry retains its own).
    pub fn register(
        &mut self,
        policy: TaskPolicy,
        creation_time: Time,
        spawn_location: &'static Location<'static>,
    ) -> Result<TaskRecord> {
        let id = policy.task_id;
        if id.is_none() {
            return Err(Error::new(ErrorKind::DuplicateTask).with_context("task id 0 is reserved"));
        }
        if self.tasks.contains_key(&id) || self.retired.contains(&id) {
            return Err(
                Error::new(ErrorKind::DuplicateTask).with_context(format!("task {id} already used"))
            );
        }
        if self.tasks.len() >= MAX_TASKS {
            return Err(Error::new(ErrorKind::RegistryFull));
        }

        let generation_depth = if policy.parent_id.is_none() {
            0
        } else {
            let parent = self
                .tasks
                .get(&policy.parent_id)
                .ok_or(ErrorKind::UnknownTask)
                .with_context(|| format!("parent {} not registered", policy.parent_id))?;
            let depth = parent.shared().generation_depth() + 1;
            if depth > MAX_HIERARCHY_DEPTH {
                return Err(Error::new(ErrorKind::HierarchyDepthExceeded)
                    .with_context(format!("depth {depth} exceeds {MAX_HIERARCHY_DEPTH}")));
            }
            if self.child_count(policy.parent_id) >= MAX_CHILDREN_PER_PROCESS {
                return Err(Error::new(ErrorKind::ChildLimitExceeded).with_context(format!(
                    "parent {} already has {MAX_CHILDREN_PER_PROCESS} children",
                    policy.parent_id
                )));
            }
            depth
        };

        let record = TaskRecord::new(policy, generation_depth, creation_time, spawn_location);
        debug!(
            task = %id,
            parent = %record.parent_id(),
            depth = generation_depth,
            "task registered"
        );
        self.tasks.insert(id, record.clone());
        Ok(record)
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn lookup(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&id)
    }

    /// Returns the live direct children of `parent_id`, ascending by task
    /// id.
    ///
    /// Terminated children are excluded: a record outlives termination only
    /// for inspection via [`TaskRegistry::lookup`], not as a member of the
    /// genealogy. The ordering makes destruction-policy visitation
    /// deterministic across runs.
    #[must_use]
    pub fn children_of(&self, parent_id: TaskId) -> Vec<TaskRecord> {
        let mut children: Vec<TaskRecord> = self
            .tasks
            .values()
            .filter(|record| {
                record.parent_id() == parent_id
                    && !parent_id.is_none()
                    && !record.state().is_terminal()
            })
            .cloned()
            .collect();
        children.sort_by_key(TaskRecord::id);
        children
    }

    /// Returns the number of live direct children of `parent_id`.
    #[must_use]
    pub fn child_count(&self, parent_id: TaskId) -> usize {
        if parent_id.is_none() {
            return 0;
        }
        self.tasks
            .values()
            .filter(|record| record.parent_id() == parent_id && !record.state().is_terminal())
            .count()
    }

    /// Removes a terminated task from the registry.
    ///
    /// Callers must only unregister after the task reached `Terminated` and
    /// its tokens were reclaimed. The id is retired and never accepted
    /// again.
    pub fn unregister(&mut self, id: TaskId) -> Result<TaskRecord> {
        let record = self
            .tasks
            .get(&id)
            .ok_or(ErrorKind::UnknownTask)
            .with_context(|| format!("{id}"))?;
        if !record.state().is_terminal() {
            return Err(Error::new(ErrorKind::RequesterNotRunnable)
                .with_context(format!("{id} is not terminated")));
        }
        let record = self
            .tasks
            .remove(&id)
            .ok_or_else(|| Error::new(ErrorKind::Internal))?;
        self.retired.insert(id);
        debug!(task = %id, "task unregistered");
        Ok(record)
    }

    /// Returns all registered task ids, ascending.
    #[must_use]
    pub fn ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.tasks.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
