//! Formatting helpers for todo-list CLI output
//!
//! This module contains formatting logic for displaying tasks and fired
//! reminders.

use chrono::Local;

use crate::scheduler::Reminder;
use crate::todo::Task;

/// Format tasks into a display string
///
/// # Arguments
/// * `tasks` - Tasks to format, in display order
///
/// # Returns
/// Formatted string representation of the tasks
pub fn format_tasks(tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return "No tasks found".to_string();
    }

    let now = Local::now();
    let mut result = format!("Found {} task(s):\n\n", tasks.len());
    for task in tasks {
        let check = if task.is_completed { "x" } else { " " };
        result.push_str(&format!("- [{}] {} (id: {})\n", check, task.name, task.id));

        if task.is_flagged {
            result.push_str("  Flagged\n");
        }
        if let Some(date) = task.notified_date {
            let state = if task.reminder_pending(now) {
                "pending"
            } else {
                "past"
            };
            result.push_str(&format!(
                "  Reminder: {} ({})\n",
                date.format("%Y-%m-%d %H:%M"),
                state
            ));
        }
    }

    result
}

/// Format a fired reminder for terminal delivery
pub fn format_reminder(reminder: &Reminder) -> String {
    format!(
        "[{}] {}: {} (task {})",
        reminder.fire_at.format("%H:%M"),
        reminder.title,
        reminder.body,
        reminder.task_id
    )
}
