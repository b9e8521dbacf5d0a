use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable identity of a task
///
/// The id is assigned once at creation and never changes. It doubles as the
/// key under which reminders are scheduled, so re-registering a reminder for
/// the same id replaces the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

/// Opaque reference to a task's slot in the persistent store
///
/// Distinct from [`TaskId`]: handles are assigned by the store per run and
/// index order/delete operations. They are not persisted; the store hands out
/// new ones every time it loads its file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageHandle(pub(crate) u64);

/// One todo item
///
/// `order` is a strict total order over all non-deleted tasks and defines the
/// display sequence. `notified_date`, when present and in the future, means a
/// reminder keyed by `id` is expected to be pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Store-assigned slot reference, rebuilt on every load
    #[serde(skip)]
    pub handle: StorageHandle,
    pub name: String,
    pub order: i64,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_date: Option<DateTime<Local>>,
}

impl Task {
    /// Check whether a reminder should be pending for this task at `now`
    pub fn reminder_pending(&self, now: DateTime<Local>) -> bool {
        self.notified_date.is_some_and(|date| date > now)
    }
}

/// Edit mode of the task list
///
/// A two-state machine toggled by the UI. It gates row editing affordances
/// and does not itself trigger store mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Inactive,
    Active,
}

impl EditMode {
    pub fn is_active(&self) -> bool {
        *self == EditMode::Active
    }
}

/// Selection mode of the task list
///
/// Independent from [`EditMode`]. Selection is only meaningful while this is
/// `Active`; returning to `Inactive` clears the selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectMode {
    #[default]
    Inactive,
    Active,
}

impl SelectMode {
    pub fn is_active(&self) -> bool {
        *self == SelectMode::Active
    }
}
