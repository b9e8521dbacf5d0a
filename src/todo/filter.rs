//! Display filter for the task list
//!
//! A [`TaskFilter`] is the conjunction of zero or more conditions built from
//! the controller's toggles and search text. An empty filter matches every
//! task. Stores interpret the same struct when fetching, so the filtering
//! semantics live in exactly one place.

use super::task::Task;

/// Conjunction of display filters applied to the task collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Keep only flagged tasks
    pub flagged_only: bool,
    /// Drop completed tasks
    pub exclude_completed: bool,
    /// Keep tasks whose name starts with this text, case-insensitively
    pub name_prefix: Option<String>,
}

impl TaskFilter {
    /// A filter that matches every task
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Evaluate the filter against a single task
    pub fn matches(&self, task: &Task) -> bool {
        if self.flagged_only && !task.is_flagged {
            return false;
        }
        if self.exclude_completed && task.is_completed {
            return false;
        }
        if let Some(ref prefix) = self.name_prefix
            && !name_starts_with(&task.name, prefix)
        {
            return false;
        }
        true
    }
}

/// Case-insensitive prefix match on the task name
///
/// Uses Unicode lowercase folding. A prefix anywhere past the start of the
/// name does not match.
fn name_starts_with(name: &str, prefix: &str) -> bool {
    name.to_lowercase().starts_with(&prefix.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::TaskId;

    fn task(name: &str, is_completed: bool, is_flagged: bool) -> Task {
        Task {
            id: TaskId::new(),
            handle: Default::default(),
            name: name.to_string(),
            order: 0,
            is_completed,
            is_flagged,
            notified_date: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TaskFilter::match_all();
        assert!(filter.matches(&task("Buy milk", false, false)));
        assert!(filter.matches(&task("", true, true)));
    }

    #[test]
    fn flagged_only_drops_unflagged() {
        let filter = TaskFilter {
            flagged_only: true,
            ..Default::default()
        };
        assert!(filter.matches(&task("a", false, true)));
        assert!(!filter.matches(&task("a", false, false)));
    }

    #[test]
    fn exclude_completed_drops_completed() {
        let filter = TaskFilter {
            exclude_completed: true,
            ..Default::default()
        };
        assert!(filter.matches(&task("a", false, false)));
        assert!(!filter.matches(&task("a", true, false)));
    }

    #[test]
    fn prefix_search_is_anchored_and_case_insensitive() {
        let filter = TaskFilter {
            name_prefix: Some("Buy".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&task("buy milk", false, false)));
        assert!(filter.matches(&task("BUY EGGS", false, false)));
        assert!(!filter.matches(&task("I will buy milk", false, false)));
    }

    #[test]
    fn conditions_combine_as_conjunction() {
        let filter = TaskFilter {
            flagged_only: true,
            exclude_completed: true,
            name_prefix: Some("pay".to_string()),
        };
        assert!(filter.matches(&task("Pay rent", false, true)));
        assert!(!filter.matches(&task("Pay rent", true, true)));
        assert!(!filter.matches(&task("Pay rent", false, false)));
        assert!(!filter.matches(&task("rent", false, true)));
    }
}
