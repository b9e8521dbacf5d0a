//! Local reminder scheduling
//!
//! [`LocalScheduler`] turns a task's reminder request into a one-shot timer
//! keyed by the task id. When the timer fires, the scheduler hands a
//! [`Reminder`] to the delivery channel supplied at construction; whatever
//! sits on the other end (the CLI watch loop, a platform notification shim)
//! presents it to the user. Registering the same id again replaces the
//! pending timer, and `cancel` removes it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::todo::TaskId;

/// Identifier of the shared notification category for todo reminders
pub const REMINDER_CATEGORY: &str = "todo";

/// Scheduling failure surfaced to callers
#[derive(Debug, Error)]
pub enum SchedulingError {
    /// The trigger moment is not in the future (minute precision)
    #[error("reminder date {0} is not in the future")]
    DatePassed(DateTime<Local>),
    /// Nothing is listening on the delivery channel
    #[error("reminder delivery channel closed")]
    ChannelClosed,
}

/// Action a reminder offers to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderAction {
    /// Mark the associated task completed
    Complete,
}

/// Alert sound attached to a reminder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReminderSound {
    #[default]
    Default,
}

/// Process-global action category shared by every todo reminder
///
/// The category definition is static, so it is installed exactly once per
/// process rather than on every registration.
#[derive(Debug, Clone)]
pub struct ReminderCategory {
    pub id: &'static str,
    pub actions: &'static [ReminderAction],
}

static CATEGORY: OnceLock<ReminderCategory> = OnceLock::new();

/// Install the shared reminder category, idempotently
pub fn install_category() -> &'static ReminderCategory {
    CATEGORY.get_or_init(|| ReminderCategory {
        id: REMINDER_CATEGORY,
        actions: &[ReminderAction::Complete],
    })
}

/// A scheduled notification unit, delivered when its trigger fires
#[derive(Debug, Clone)]
pub struct Reminder {
    /// Stable key: the task id, string-encoded
    pub key: String,
    pub title: String,
    /// The task name
    pub body: String,
    pub sound: ReminderSound,
    pub category: &'static str,
    /// Payload so a reaction handler can resolve the task
    pub task_id: TaskId,
    /// The calendar moment the trigger was scheduled for
    pub fire_at: DateTime<Local>,
}

/// Scheduler boundary consumed by the controller
pub trait ReminderScheduler: Send + Sync {
    /// Schedule a one-shot reminder for `id` at `date`
    ///
    /// Seconds are dropped from `date`; the trigger fires at the calendar
    /// minute. Registering an id that already has a pending reminder
    /// replaces it, it never duplicates.
    fn register(&self, id: TaskId, name: &str, date: DateTime<Local>)
    -> Result<(), SchedulingError>;

    /// Remove the pending reminder keyed by `id`, if any
    fn cancel(&self, id: TaskId);
}

/// A pending timer, stamped so a firing timer only evicts itself
///
/// Without the stamp, a timer firing concurrently with a re-registration
/// could remove its replacement's map entry, leaving the replacement
/// uncancellable.
struct PendingTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Tokio-timer-backed scheduler
pub struct LocalScheduler {
    delivery: mpsc::UnboundedSender<Reminder>,
    pending: Arc<Mutex<HashMap<TaskId, PendingTimer>>>,
    generations: AtomicU64,
}

impl LocalScheduler {
    /// Create a scheduler that delivers fired reminders to `delivery`
    pub fn new(delivery: mpsc::UnboundedSender<Reminder>) -> Self {
        install_category();
        Self {
            delivery,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generations: AtomicU64::new(0),
        }
    }

    /// Number of reminders currently pending
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Check whether a reminder is pending for `id`
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending
            .lock()
            .unwrap()
            .get(&id)
            .is_some_and(|timer| !timer.handle.is_finished())
    }
}

impl ReminderScheduler for LocalScheduler {
    fn register(
        &self,
        id: TaskId,
        name: &str,
        date: DateTime<Local>,
    ) -> Result<(), SchedulingError> {
        if self.delivery.is_closed() {
            return Err(SchedulingError::ChannelClosed);
        }

        // Calendar-moment trigger: second-level precision is dropped.
        let fire_at = truncate_to_minute(date);
        let now = Local::now();
        if fire_at <= now {
            return Err(SchedulingError::DatePassed(fire_at));
        }
        let delay = (fire_at - now).to_std().unwrap_or(Duration::ZERO);

        let reminder = Reminder {
            key: id.to_string(),
            title: "Todo".to_string(),
            body: name.to_string(),
            sound: ReminderSound::Default,
            category: install_category().id,
            task_id: id,
            fire_at,
        };

        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let delivery = self.delivery.clone();
        let pending = Arc::clone(&self.pending);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if delivery.send(reminder).is_err() {
                warn!(key = %id, "reminder delivery channel closed before trigger");
            }
            let mut map = pending.lock().unwrap();
            if map.get(&id).is_some_and(|t| t.generation == generation) {
                map.remove(&id);
            }
        });

        // Same key replaces: at most one pending reminder per id.
        let timer = PendingTimer { generation, handle };
        if let Some(prev) = self.pending.lock().unwrap().insert(id, timer) {
            prev.handle.abort();
        }
        Ok(())
    }

    fn cancel(&self, id: TaskId) {
        if let Some(timer) = self.pending.lock().unwrap().remove(&id) {
            timer.handle.abort();
        }
    }
}

/// Drop seconds and sub-second precision from a reminder date
fn truncate_to_minute(date: DateTime<Local>) -> DateTime<Local> {
    date.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(date)
}
