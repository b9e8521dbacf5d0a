//! Integration tests for the TOML-backed task store

use std::collections::HashSet;

use chrono::{Duration, Local, Timelike};
use tempfile::NamedTempFile;
use todo_list::{Storage, StorageHandle, StoreError, TaskFilter, TaskId, TaskStore};

#[tokio::test]
async fn round_trip_preserves_fields() {
    let temp_file = NamedTempFile::new().unwrap();
    let date = (Local::now() + Duration::days(1)).with_nanosecond(0).unwrap();
    let id = TaskId::new();

    {
        let store = Storage::new(temp_file.path()).unwrap();
        store.add(id, "Pay rent", Some(date), true).await.unwrap();
        store.save_if_needed().unwrap();
    }

    let store = Storage::new(temp_file.path()).unwrap();
    let tasks = store.fetch(&TaskFilter::match_all()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, id);
    assert_eq!(tasks[0].name, "Pay rent");
    assert!(tasks[0].is_flagged);
    assert!(!tasks[0].is_completed);
    assert_eq!(tasks[0].notified_date, Some(date));
}

#[tokio::test]
async fn handles_are_reassigned_on_load() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let store = Storage::new(temp_file.path()).unwrap();
        store.add(TaskId::new(), "A", None, false).await.unwrap();
        store.add(TaskId::new(), "B", None, false).await.unwrap();
        store.save_if_needed().unwrap();
    }

    let store = Storage::new(temp_file.path()).unwrap();
    let tasks = store.fetch(&TaskFilter::match_all()).unwrap();
    let handles: HashSet<StorageHandle> = tasks.iter().map(|t| t.handle).collect();
    assert_eq!(handles.len(), tasks.len());
    assert!(!handles.contains(&StorageHandle::default()));
}

#[tokio::test]
async fn update_order_rejects_stale_handle() {
    let store = Storage::in_memory();
    let task = store.add(TaskId::new(), "A", None, false).await.unwrap();
    store
        .delete_ids(&HashSet::from([task.id]))
        .await
        .unwrap();

    let result = store.update_order(&[task.handle]);
    assert!(matches!(result, Err(StoreError::UnknownHandle)));
}

#[tokio::test]
async fn missing_file_yields_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = Storage::new(dir.path().join("todo.toml")).unwrap();
    assert!(store.fetch(&TaskFilter::match_all()).unwrap().is_empty());
}

#[tokio::test]
async fn new_tasks_append_to_the_display_sequence() {
    let store = Storage::in_memory();
    for name in ["A", "B", "C"] {
        store.add(TaskId::new(), name, None, false).await.unwrap();
    }

    let tasks = store.fetch(&TaskFilter::match_all()).unwrap();
    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C"]);
    let orders: HashSet<i64> = tasks.iter().map(|t| t.order).collect();
    assert_eq!(orders.len(), 3);
}
