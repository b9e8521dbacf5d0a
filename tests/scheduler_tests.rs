//! Integration tests for the local reminder scheduler

use std::time::Duration as StdDuration;

use chrono::{Duration, Local, Timelike};
use todo_list::scheduler::{
    LocalScheduler, ReminderAction, ReminderScheduler, SchedulingError, install_category,
    REMINDER_CATEGORY,
};
use todo_list::TaskId;
use tokio::sync::mpsc;

#[tokio::test(start_paused = true)]
async fn registering_same_id_replaces_pending_reminder() {
    let (delivery, mut reminders) = mpsc::unbounded_channel();
    let scheduler = LocalScheduler::new(delivery);
    let id = TaskId::new();

    let first = Local::now() + Duration::minutes(5);
    let second = Local::now() + Duration::minutes(10);
    scheduler.register(id, "X", first).unwrap();
    scheduler.register(id, "Y", second).unwrap();
    assert_eq!(scheduler.pending_count(), 1);

    tokio::time::advance(StdDuration::from_secs(15 * 60)).await;
    let fired = reminders.recv().await.unwrap();
    assert_eq!(fired.body, "Y");
    assert_eq!(fired.key, id.to_string());

    // The replaced registration never fires.
    assert!(reminders.try_recv().is_err());
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn fired_reminder_carries_category_and_payload() {
    let (delivery, mut reminders) = mpsc::unbounded_channel();
    let scheduler = LocalScheduler::new(delivery);
    let id = TaskId::new();

    scheduler
        .register(id, "Buy milk", Local::now() + Duration::minutes(2))
        .unwrap();
    tokio::time::advance(StdDuration::from_secs(3 * 60)).await;

    let fired = reminders.recv().await.unwrap();
    assert_eq!(fired.title, "Todo");
    assert_eq!(fired.body, "Buy milk");
    assert_eq!(fired.category, REMINDER_CATEGORY);
    assert_eq!(fired.task_id, id);
    assert_eq!(fired.fire_at.second(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_removes_pending_reminder() {
    let (delivery, mut reminders) = mpsc::unbounded_channel();
    let scheduler = LocalScheduler::new(delivery);
    let id = TaskId::new();

    scheduler
        .register(id, "X", Local::now() + Duration::minutes(5))
        .unwrap();
    assert!(scheduler.is_pending(id));

    scheduler.cancel(id);
    assert!(!scheduler.is_pending(id));
    assert_eq!(scheduler.pending_count(), 0);

    tokio::time::advance(StdDuration::from_secs(10 * 60)).await;
    assert!(reminders.try_recv().is_err());
}

#[tokio::test]
async fn past_date_is_rejected() {
    let (delivery, _reminders) = mpsc::unbounded_channel();
    let scheduler = LocalScheduler::new(delivery);

    let result = scheduler.register(TaskId::new(), "X", Local::now() - Duration::hours(1));
    assert!(matches!(result, Err(SchedulingError::DatePassed(_))));
    assert_eq!(scheduler.pending_count(), 0);
}

#[tokio::test]
async fn seconds_within_current_minute_are_rejected() {
    let (delivery, _reminders) = mpsc::unbounded_channel();
    let scheduler = LocalScheduler::new(delivery);

    // Truncation pulls the trigger back to the top of the current minute,
    // which is never in the future.
    let date = Local::now().with_second(30).unwrap();
    let result = scheduler.register(TaskId::new(), "X", date);
    assert!(matches!(result, Err(SchedulingError::DatePassed(_))));
}

#[tokio::test]
async fn closed_delivery_channel_is_rejected() {
    let (delivery, reminders) = mpsc::unbounded_channel();
    let scheduler = LocalScheduler::new(delivery);
    drop(reminders);

    let result = scheduler.register(TaskId::new(), "X", Local::now() + Duration::hours(1));
    assert!(matches!(result, Err(SchedulingError::ChannelClosed)));
}

#[test]
fn category_offers_single_complete_action() {
    let category = install_category();
    assert_eq!(category.id, REMINDER_CATEGORY);
    assert_eq!(category.actions, [ReminderAction::Complete]);
}
