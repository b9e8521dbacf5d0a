//! Task store boundary
//!
//! The controller talks to persistence exclusively through the [`TaskStore`]
//! trait. `fetch`, `update_order`, and `save_if_needed` are synchronous;
//! creation, field updates, and deletion are async and may suspend while the
//! store performs I/O. Every mutation emits a payload-free [`StoreChanged`]
//! broadcast so observers can refetch.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::todo::{StorageHandle, Task, TaskFilter, TaskId};

/// Persistence failure surfaced to callers
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize task data: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to parse task data: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("unknown storage handle")]
    UnknownHandle,
}

/// Broadcast when something in the store changed
///
/// Carries no payload: observers are expected to refetch whatever they
/// derive from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreChanged;

/// Field-level update applied by [`TaskStore::update`]
///
/// `None` leaves a field unchanged. `notified_date` is doubly optional so
/// that clearing the date is distinct from not touching it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub is_completed: Option<bool>,
    pub is_flagged: Option<bool>,
    pub notified_date: Option<Option<DateTime<Local>>>,
}

impl TaskPatch {
    /// Patch that sets the completion state
    pub fn completed(is_completed: bool) -> Self {
        Self {
            is_completed: Some(is_completed),
            ..Default::default()
        }
    }

    /// Patch that sets the flagged state
    pub fn flagged(is_flagged: bool) -> Self {
        Self {
            is_flagged: Some(is_flagged),
            ..Default::default()
        }
    }

    /// Patch that sets or clears the reminder date
    pub fn reminder(notified_date: Option<DateTime<Local>>) -> Self {
        Self {
            notified_date: Some(notified_date),
            ..Default::default()
        }
    }

    /// Patch that renames the task
    pub fn renamed(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Persistence collaborator for the todo list
///
/// Implementations must keep `order` a strict total order over the stored
/// tasks and must emit [`StoreChanged`] after every successful mutation.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch tasks matching `filter`, ordered by `order` ascending
    fn fetch(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    /// Create and persist a new task
    ///
    /// The caller supplies the id so it can key a reminder to the task
    /// before or after the store call completes.
    async fn add(
        &self,
        id: TaskId,
        name: &str,
        notified_date: Option<DateTime<Local>>,
        is_flagged: bool,
    ) -> Result<Task, StoreError>;

    /// Apply a field-level patch to an existing task
    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError>;

    /// Persist a new ordering for the given handles
    ///
    /// The ranks currently held by the handles are redistributed across the
    /// new sequence, so tasks outside `handles` keep their relative position
    /// and `order` stays unique store-wide.
    fn update_order(&self, handles: &[StorageHandle]) -> Result<(), StoreError>;

    /// Remove the tasks behind the given handles
    async fn delete_handles(&self, handles: &[StorageHandle]) -> Result<(), StoreError>;

    /// Remove the tasks with the given ids
    async fn delete_ids(&self, ids: &HashSet<TaskId>) -> Result<(), StoreError>;

    /// Flush pending in-memory edits to the backing file, if any
    fn save_if_needed(&self) -> Result<(), StoreError>;

    /// Subscribe to change notifications
    fn subscribe(&self) -> broadcast::Receiver<StoreChanged>;
}
