//! Common test utilities for integration tests

use std::sync::Arc;
use std::time::Duration;

use tempfile::NamedTempFile;
use todo_list::{LocalScheduler, Reminder, Storage, TodoListController};
use tokio::sync::mpsc;

/// A controller wired to its collaborators, everything observable
pub struct TestRig {
    pub controller: TodoListController,
    pub store: Arc<Storage>,
    pub scheduler: Arc<LocalScheduler>,
    pub reminders: mpsc::UnboundedReceiver<Reminder>,
}

/// Create a test rig with in-memory storage
#[allow(dead_code)]
pub fn get_test_rig() -> TestRig {
    rig_with_store(Arc::new(Storage::in_memory()))
}

/// Create a test rig with temp-file storage
#[allow(dead_code)]
pub fn get_file_rig() -> (TestRig, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let store = Arc::new(Storage::new(temp_file.path()).unwrap());
    (rig_with_store(store), temp_file)
}

fn rig_with_store(store: Arc<Storage>) -> TestRig {
    let (delivery, reminders) = mpsc::unbounded_channel();
    let scheduler = Arc::new(LocalScheduler::new(delivery));
    let controller =
        TodoListController::new(Arc::clone(&store) as _, Arc::clone(&scheduler) as _);
    TestRig {
        controller,
        store,
        scheduler,
        reminders,
    }
}

/// Give the controller's store watcher a chance to process change events
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}
