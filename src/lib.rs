//! Todo List Core Library
//!
//! This library provides the core of a personal todo manager: an ordered,
//! filterable, store-backed task collection with timed local reminders tied
//! to the task lifecycle.
//!
//! # Architecture
//!
//! The library follows a 3-layer architecture:
//! - **Controller Layer**: [`TodoListController`] - Orchestrates user intents
//!   and owns the derived visible task list
//! - **Domain Layer**: `todo` module - Task entity and display filters
//! - **Collaborator Layer**: `store` / `storage` (persistence) and
//!   `scheduler` (reminders)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_list::{LocalScheduler, Storage, TodoListController};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(Storage::new("todo.toml")?);
//!     let (delivery, _reminders) = tokio::sync::mpsc::unbounded_channel();
//!     let scheduler = Arc::new(LocalScheduler::new(delivery));
//!     let controller = TodoListController::new(store, scheduler);
//!     controller.add("Pay rent", None, true).await?;
//!     Ok(())
//! }
//! ```

pub mod format;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod todo;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::warn;

// Re-export commonly used types
pub use scheduler::{
    LocalScheduler, Reminder, ReminderAction, ReminderScheduler, SchedulingError,
};
pub use storage::Storage;
pub use store::{StoreChanged, StoreError, TaskPatch, TaskStore};
pub use todo::{EditMode, SelectMode, StorageHandle, Task, TaskFilter, TaskId};

/// UI-facing state owned by the controller
///
/// Everything here is derived or ephemeral; the store remains the source of
/// truth for tasks themselves.
#[derive(Default)]
struct ViewState {
    visible: Vec<Task>,
    hide_completed: bool,
    hide_unflagged: bool,
    search_text: String,
    edit_mode: EditMode,
    select_mode: SelectMode,
    selection: HashSet<TaskId>,
}

impl ViewState {
    fn filter(&self) -> TaskFilter {
        TaskFilter {
            flagged_only: self.hide_unflagged,
            exclude_completed: self.hide_completed,
            name_prefix: if self.search_text.is_empty() {
                None
            } else {
                Some(self.search_text.clone())
            },
        }
    }
}

/// Stateful orchestrator between user intents and the store / scheduler
///
/// The controller owns the filter toggles, search text, list modes, and the
/// selection, and caches the derived visible task sequence. It subscribes to
/// the store's change broadcast for its entire lifetime: on every event it
/// asks the store to persist pending edits and then refreshes the view. The
/// subscription ends when the controller is dropped.
///
/// All state lives behind a single mutex, so mutation entry points are
/// serialized regardless of which task invokes them.
pub struct TodoListController {
    store: Arc<dyn TaskStore>,
    scheduler: Arc<dyn ReminderScheduler>,
    state: Arc<Mutex<ViewState>>,
    default_title: String,
    watcher: JoinHandle<()>,
}

impl TodoListController {
    /// Create a controller showing all tasks, titled "Tasks"
    ///
    /// Must be called within a tokio runtime; the store watcher is spawned
    /// at construction.
    pub fn new(store: Arc<dyn TaskStore>, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        Self::with_options(store, scheduler, false, "Tasks")
    }

    /// Create a controller with an initial unflagged-hiding mode and title
    pub fn with_options(
        store: Arc<dyn TaskStore>,
        scheduler: Arc<dyn ReminderScheduler>,
        hide_unflagged: bool,
        default_title: impl Into<String>,
    ) -> Self {
        let state = Arc::new(Mutex::new(ViewState {
            hide_unflagged,
            ..Default::default()
        }));
        let watcher = Self::spawn_watcher(Arc::clone(&store), Arc::clone(&state));
        let controller = Self {
            store,
            scheduler,
            state,
            default_title: default_title.into(),
            watcher,
        };

        // Populate the view at construction, like any later refresh.
        if let Err(e) = controller.refresh() {
            warn!("initial refresh failed: {e}");
        }
        controller
    }

    /// Watch the store's change broadcast for the controller's lifetime
    ///
    /// On every event: persist pending edits, then refetch. Failures are
    /// logged; there is no caller to surface them to.
    fn spawn_watcher(store: Arc<dyn TaskStore>, state: Arc<Mutex<ViewState>>) -> JoinHandle<()> {
        let mut events = store.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(StoreChanged) | Err(RecvError::Lagged(_)) => {
                        if let Err(e) = store.save_if_needed() {
                            warn!("deferred save failed: {e}");
                        }
                        if let Err(e) = Self::refresh_view(store.as_ref(), &state) {
                            warn!("refresh after store change failed: {e}");
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn refresh_view(store: &dyn TaskStore, state: &Mutex<ViewState>) -> Result<(), StoreError> {
        let filter = state.lock().unwrap().filter();
        let tasks = store.fetch(&filter)?;
        state.lock().unwrap().visible = tasks;
        Ok(())
    }

    /// Recompute the visible task sequence from the store
    ///
    /// Pure derivation: queries the store with the current filter, ordered
    /// ascending, and replaces the cached view. Call after toggling filters
    /// or searching; mutations refresh via the change-notification path.
    pub fn refresh(&self) -> Result<(), StoreError> {
        Self::refresh_view(self.store.as_ref(), &self.state)
    }

    /// Snapshot of the visible tasks, in display order
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().visible.clone()
    }

    /// The filter that `refresh` passes to the store
    pub fn filter(&self) -> TaskFilter {
        self.state.lock().unwrap().filter()
    }

    pub fn hide_completed(&self) -> bool {
        self.state.lock().unwrap().hide_completed
    }

    pub fn set_hide_completed(&self, hide: bool) {
        self.state.lock().unwrap().hide_completed = hide;
    }

    /// Whether unflagged tasks are hidden (fixed at construction)
    pub fn hide_unflagged(&self) -> bool {
        self.state.lock().unwrap().hide_unflagged
    }

    pub fn search_text(&self) -> String {
        self.state.lock().unwrap().search_text.clone()
    }

    pub fn set_search_text(&self, text: impl Into<String>) {
        self.state.lock().unwrap().search_text = text.into();
    }

    pub fn edit_mode(&self) -> EditMode {
        self.state.lock().unwrap().edit_mode
    }

    pub fn set_edit_mode(&self, mode: EditMode) {
        self.state.lock().unwrap().edit_mode = mode;
    }

    pub fn select_mode(&self) -> SelectMode {
        self.state.lock().unwrap().select_mode
    }

    /// Switch selection mode; leaving it drops the selection
    pub fn set_select_mode(&self, mode: SelectMode) {
        let mut state = self.state.lock().unwrap();
        if mode == SelectMode::Inactive {
            state.selection.clear();
        }
        state.select_mode = mode;
    }

    /// Snapshot of the selected task ids
    pub fn selection(&self) -> HashSet<TaskId> {
        self.state.lock().unwrap().selection.clone()
    }

    /// Add a task id to the selection
    ///
    /// Selection is only meaningful while select mode is active.
    pub fn select(&self, id: TaskId) {
        self.state.lock().unwrap().selection.insert(id);
    }

    pub fn deselect(&self, id: TaskId) {
        self.state.lock().unwrap().selection.remove(&id);
    }

    /// Title for the list chrome: the selection count, or the default title
    pub fn navigation_label(&self) -> String {
        let state = self.state.lock().unwrap();
        if state.selection.is_empty() {
            self.default_title.clone()
        } else {
            format!("{} Selected", state.selection.len())
        }
    }

    /// Create a task and, for a future `notified_date`, schedule its reminder
    ///
    /// Store failures propagate to the caller; a scheduling failure after a
    /// successful add is logged and does not fail the already-persisted task.
    pub async fn add(
        &self,
        name: &str,
        notified_date: Option<DateTime<Local>>,
        is_flagged: bool,
    ) -> Result<Task, StoreError> {
        let task = self
            .store
            .add(TaskId::new(), name, notified_date, is_flagged)
            .await?;

        if let Some(date) = notified_date
            && date > Local::now()
        {
            if let Err(e) = self.scheduler.register(task.id, name, date) {
                warn!(task = %task.id, "could not schedule reminder: {e}");
            }
        }
        Ok(task)
    }

    /// Move the visible tasks at `from` in front of position `to`
    ///
    /// `to` is indexed in the pre-removal coordinate space of the visible
    /// sequence. The new ordering is persisted through the store; the cached
    /// view stays as-is until the change notification refreshes it.
    pub fn move_tasks(&self, from: &[usize], to: usize) -> Result<(), StoreError> {
        let handles = {
            let state = self.state.lock().unwrap();
            let mut handles: Vec<StorageHandle> =
                state.visible.iter().map(|t| t.handle).collect();
            move_offsets(&mut handles, from, to);
            handles
        };
        self.store.update_order(&handles)
    }

    /// Delete the visible tasks at the given indices
    ///
    /// Cancels the reminders of the removed tasks. Does not refresh; the
    /// change-notification path does.
    pub async fn delete_tasks_at(&self, indices: &[usize]) -> Result<(), StoreError> {
        let (handles, ids): (Vec<StorageHandle>, Vec<TaskId>) = {
            let state = self.state.lock().unwrap();
            indices
                .iter()
                .filter_map(|&i| state.visible.get(i))
                .map(|t| (t.handle, t.id))
                .unzip()
        };
        self.store.delete_handles(&handles).await?;
        for id in ids {
            // Deleted tasks carry no reminder.
            self.scheduler.cancel(id);
        }
        Ok(())
    }

    /// Delete tasks by id, visible or not
    pub async fn delete_tasks_by_id(&self, ids: &HashSet<TaskId>) -> Result<(), StoreError> {
        self.store.delete_ids(ids).await?;
        for &id in ids {
            self.scheduler.cancel(id);
        }
        Ok(())
    }

    /// Set a task's completion state
    ///
    /// Completing a task cancels its pending reminder; there is nothing left
    /// to ring about.
    pub async fn set_completed(&self, id: TaskId, is_completed: bool) -> Result<Task, StoreError> {
        let task = self.store.update(id, TaskPatch::completed(is_completed)).await?;
        if is_completed {
            self.scheduler.cancel(id);
        }
        Ok(task)
    }

    /// Set a task's flagged state
    pub async fn set_flagged(&self, id: TaskId, is_flagged: bool) -> Result<Task, StoreError> {
        self.store.update(id, TaskPatch::flagged(is_flagged)).await
    }

    /// Set or clear a task's reminder date, keeping the scheduler in step
    ///
    /// A future date (re)registers the reminder; clearing the date or
    /// setting a past one cancels any pending reminder for the task.
    pub async fn set_notified_date(
        &self,
        id: TaskId,
        date: Option<DateTime<Local>>,
    ) -> Result<Task, StoreError> {
        let task = self.store.update(id, TaskPatch::reminder(date)).await?;
        match date {
            Some(d) if d > Local::now() => {
                if let Err(e) = self.scheduler.register(task.id, &task.name, d) {
                    warn!(task = %task.id, "could not schedule reminder: {e}");
                }
            }
            _ => self.scheduler.cancel(id),
        }
        Ok(task)
    }

    /// React to an action taken on a fired reminder
    ///
    /// The reminder's payload identifies the task; the single action the
    /// category offers marks it completed.
    pub async fn handle_reminder_action(
        &self,
        reminder: &Reminder,
        action: ReminderAction,
    ) -> Result<Task, StoreError> {
        match action {
            ReminderAction::Complete => self.set_completed(reminder.task_id, true).await,
        }
    }
}

impl Drop for TodoListController {
    fn drop(&mut self) {
        // The store subscription must not outlive the controller.
        self.watcher.abort();
    }
}

/// Reorder `items` by moving the elements at `sources` in front of the
/// element at `destination`
///
/// `destination` is interpreted in the coordinate space before removal.
/// Out-of-range sources are ignored; the moved elements keep their relative
/// order.
fn move_offsets<T>(items: &mut Vec<T>, sources: &[usize], destination: usize) {
    let mut sources: Vec<usize> = sources
        .iter()
        .copied()
        .filter(|&i| i < items.len())
        .collect();
    sources.sort_unstable();
    sources.dedup();

    let mut moved = Vec::with_capacity(sources.len());
    for &idx in sources.iter().rev() {
        moved.push(items.remove(idx));
    }
    moved.reverse();

    let shift = sources.iter().filter(|&&i| i < destination).count();
    let at = destination.saturating_sub(shift).min(items.len());
    for (offset, item) in moved.into_iter().enumerate() {
        items.insert(at + offset, item);
    }
}
