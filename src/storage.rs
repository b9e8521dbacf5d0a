//! TOML-file task store
//!
//! [`Storage`] is the bundled [`TaskStore`] implementation: tasks live in a
//! single TOML file, loaded at open and written back on save. An in-memory
//! mode backs tests and previews. Storage handles are per-run slot references
//! rebuilt on every load; they are never written to disk.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::warn;

use crate::store::{StoreChanged, StoreError, TaskPatch, TaskStore};
use crate::todo::{StorageHandle, Task, TaskFilter, TaskId};

/// On-disk document: an array of `[[task]]` tables
#[derive(Debug, Default, Serialize, Deserialize)]
struct TaskFile {
    #[serde(default)]
    task: Vec<Task>,
}

struct StoreInner {
    tasks: Vec<Task>,
    next_handle: u64,
    dirty: bool,
}

impl StoreInner {
    fn assign_handle(&mut self) -> StorageHandle {
        self.next_handle += 1;
        StorageHandle(self.next_handle)
    }

    fn position(&self, handle: StorageHandle) -> Option<usize> {
        self.tasks.iter().position(|t| t.handle == handle)
    }
}

/// TOML-file-backed task store
pub struct Storage {
    file_path: Option<PathBuf>,
    inner: Mutex<StoreInner>,
    events: broadcast::Sender<StoreChanged>,
}

impl Storage {
    /// Open a store backed by `file_path`, loading it if it exists
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first save.
    pub fn new(file_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let file_path = file_path.as_ref().to_path_buf();
        let mut tasks = if file_path.exists() {
            let content = fs::read_to_string(&file_path)?;
            let file: TaskFile = toml::from_str(&content)?;
            file.task
        } else {
            Vec::new()
        };

        // Handles are per-run; hand out fresh ones in file order.
        for (slot, task) in tasks.iter_mut().enumerate() {
            task.handle = StorageHandle(slot as u64 + 1);
        }
        let next_handle = tasks.len() as u64;
        let dirty = normalize_orders(&mut tasks);

        let (events, _) = broadcast::channel(64);
        Ok(Self {
            file_path: Some(file_path),
            inner: Mutex::new(StoreInner {
                tasks,
                next_handle,
                dirty,
            }),
            events,
        })
    }

    /// Create a store with no backing file
    pub fn in_memory() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            file_path: None,
            inner: Mutex::new(StoreInner {
                tasks: Vec::new(),
                next_handle: 0,
                dirty: false,
            }),
            events,
        }
    }

    /// Path of the backing file, if any
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn emit(&self) {
        // No receivers is fine; the event is best-effort.
        let _ = self.events.send(StoreChanged);
    }

    fn write_file(&self, inner: &mut StoreInner) -> Result<(), StoreError> {
        if let Some(path) = &self.file_path {
            let file = TaskFile {
                task: inner.tasks.clone(),
            };
            let content = toml::to_string_pretty(&file)?;
            fs::write(path, content)?;
        }
        inner.dirty = false;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for Storage {
    fn fetch(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut tasks: Vec<Task> = inner
            .tasks
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.order);
        Ok(tasks)
    }

    async fn add(
        &self,
        id: TaskId,
        name: &str,
        notified_date: Option<DateTime<Local>>,
        is_flagged: bool,
    ) -> Result<Task, StoreError> {
        let task = {
            let mut inner = self.inner.lock().unwrap();
            // New tasks go to the end of the display sequence.
            let order = inner.tasks.iter().map(|t| t.order).max().map_or(0, |m| m + 1);
            let task = Task {
                id,
                handle: inner.assign_handle(),
                name: name.to_string(),
                order,
                is_completed: false,
                is_flagged,
                notified_date,
            };
            inner.tasks.push(task.clone());
            inner.dirty = true;
            task
        };
        self.emit();
        Ok(task)
    }

    async fn update(&self, id: TaskId, patch: TaskPatch) -> Result<Task, StoreError> {
        let task = {
            let mut inner = self.inner.lock().unwrap();
            let task = inner
                .tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(StoreError::NotFound(id))?;

            if let Some(name) = patch.name {
                task.name = name;
            }
            if let Some(is_completed) = patch.is_completed {
                task.is_completed = is_completed;
            }
            if let Some(is_flagged) = patch.is_flagged {
                task.is_flagged = is_flagged;
            }
            if let Some(notified_date) = patch.notified_date {
                task.notified_date = notified_date;
            }
            let task = task.clone();
            inner.dirty = true;
            task
        };
        self.emit();
        Ok(task)
    }

    fn update_order(&self, handles: &[StorageHandle]) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.lock().unwrap();

            // Redistribute the ranks the moved handles already hold across
            // their new sequence. Tasks outside `handles` keep their ranks,
            // so the total order stays unique store-wide.
            let mut ranks = Vec::with_capacity(handles.len());
            for handle in handles {
                let pos = inner.position(*handle).ok_or(StoreError::UnknownHandle)?;
                ranks.push(inner.tasks[pos].order);
            }
            ranks.sort_unstable();

            for (handle, rank) in handles.iter().zip(ranks) {
                if let Some(pos) = inner.position(*handle) {
                    inner.tasks[pos].order = rank;
                }
            }
            inner.dirty = true;
        }
        self.emit();
        Ok(())
    }

    async fn delete_handles(&self, handles: &[StorageHandle]) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.tasks.retain(|t| !handles.contains(&t.handle));
            inner.dirty = true;
        }
        self.emit();
        Ok(())
    }

    async fn delete_ids(&self, ids: &HashSet<TaskId>) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.tasks.retain(|t| !ids.contains(&t.id));
            inner.dirty = true;
        }
        self.emit();
        Ok(())
    }

    fn save_if_needed(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.dirty {
            return Ok(());
        }
        self.write_file(&mut inner)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChanged> {
        self.events.subscribe()
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        // Flush edits that no change notification got around to saving.
        if let Err(e) = self.save_if_needed() {
            warn!("final save failed: {e}");
        }
    }
}

/// Restore strict total order after loading a file
///
/// Sorts by rank and bumps duplicates. Returns true when any rank changed,
/// in which case the caller should persist the repair.
fn normalize_orders(tasks: &mut Vec<Task>) -> bool {
    tasks.sort_by_key(|t| t.order);
    let mut changed = false;
    for i in 1..tasks.len() {
        if tasks[i].order <= tasks[i - 1].order {
            tasks[i].order = tasks[i - 1].order + 1;
            changed = true;
        }
    }
    changed
}
