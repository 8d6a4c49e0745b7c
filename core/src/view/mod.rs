use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task};

/// How the view orders tasks before completion grouping is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum SortType {
    /// Ascending by the combined due date and time.
    #[default]
    Date,
    /// Ascending by priority rank, high first.
    Priority,
    /// Creation order.
    Added,
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortType::Date => "date",
            SortType::Priority => "priority",
            SortType::Added => "added",
        };
        f.write_str(label)
    }
}

impl FromStr for SortType {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortType::Date),
            "priority" => Ok(SortType::Priority),
            "added" => Ok(SortType::Added),
            other => Err(PreferenceError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// Which tasks the view retains before sorting.
///
/// A dedicated enum rather than `Option<Priority>`, so that "no filter"
/// and [`Priority::None`] cannot be mixed up at the call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl fmt::Display for PriorityFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityFilter::All => f.write_str("all"),
            PriorityFilter::Only(priority) => write!(f, "{priority}"),
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(PriorityFilter::All);
        }
        s.parse::<Priority>()
            .map(PriorityFilter::Only)
            .map_err(|_| PreferenceError::UnknownFilter(s.to_string()))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("unknown sort order `{0}`, expected one of: date, priority, added")]
    UnknownSortOrder(String),
    #[error("unknown priority filter `{0}`, expected one of: all, high, medium, low, none")]
    UnknownFilter(String),
}

/// The filter/sort/grouping settings a view is derived under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ViewPreferences {
    pub sort: SortType,
    pub filter: PriorityFilter,
    /// When true, completed tasks group before open ones; when false,
    /// open tasks come first.
    pub completed_first: bool,
}

impl Default for ViewPreferences {
    fn default() -> Self {
        Self {
            sort: SortType::Date,
            filter: PriorityFilter::All,
            completed_first: true,
        }
    }
}

/// Derives the ordered sequence of tasks to present.
///
/// Pure with respect to the store: the input is only read, and the same
/// inputs always produce the same sequence. Filtering happens first, then
/// a single stable sort in which the completion group outranks the
/// selected sort key. Equal keys keep their slice order, which is
/// creation order, so insertion order is the universal tie-break.
pub fn derive_view<'a>(tasks: &'a [Task], prefs: &ViewPreferences) -> Vec<&'a Task> {
    let mut view: Vec<&Task> = tasks
        .iter()
        .filter(|task| match prefs.filter {
            PriorityFilter::All => true,
            PriorityFilter::Only(wanted) => task.priority == wanted,
        })
        .collect();

    view.sort_by(|a, b| {
        completion_group(a, prefs.completed_first)
            .cmp(&completion_group(b, prefs.completed_first))
            .then_with(|| match prefs.sort {
                SortType::Date => a.due_at().cmp(&b.due_at()),
                SortType::Priority => a.priority.cmp(&b.priority),
                SortType::Added => a.id.cmp(&b.id),
            })
    });
    view
}

/// 0 for the completion group shown first, 1 for the other.
fn completion_group(task: &Task, completed_first: bool) -> u8 {
    if task.completed == completed_first { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u32, date: &str, time: &str, priority: Priority, completed: bool) -> Task {
        Task {
            id,
            name: format!("task {id}"),
            description: String::new(),
            due_date: date.parse().unwrap(),
            due_time: time.parse().unwrap(),
            priority,
            completed,
        }
    }

    fn ids(view: &[&Task]) -> Vec<u32> {
        view.iter().map(|task| task.id).collect()
    }

    fn prefs(sort: SortType) -> ViewPreferences {
        ViewPreferences {
            sort,
            ..ViewPreferences::default()
        }
    }

    #[test]
    fn empty_collection_derives_an_empty_view() {
        let view = derive_view(&[], &ViewPreferences::default());
        assert!(view.is_empty());
    }

    #[test]
    fn default_preferences_match_the_initial_view_state() {
        let default = ViewPreferences::default();

        assert_eq!(default.sort, SortType::Date);
        assert_eq!(default.filter, PriorityFilter::All);
        assert!(default.completed_first);
    }

    #[test]
    fn date_sort_orders_by_combined_due_instant() {
        let tasks = vec![
            task(1, "2024-01-02", "08:00:00", Priority::High, false),
            task(2, "2024-01-01", "23:59:00", Priority::Low, false),
        ];

        let view = derive_view(&tasks, &prefs(SortType::Date));

        assert_eq!(ids(&view), vec![2, 1]);
    }

    #[test]
    fn date_sort_breaks_same_day_ties_on_time() {
        let tasks = vec![
            task(1, "2024-01-01", "18:00:00", Priority::None, false),
            task(2, "2024-01-01", "07:30:00", Priority::None, false),
        ];

        let view = derive_view(&tasks, &prefs(SortType::Date));

        assert_eq!(ids(&view), vec![2, 1]);
    }

    #[test]
    fn priority_sort_orders_by_fixed_rank() {
        let tasks = vec![
            task(1, "2024-01-02", "23:59:00", Priority::High, false),
            task(2, "2024-01-01", "23:59:00", Priority::Low, false),
        ];

        let view = derive_view(&tasks, &prefs(SortType::Priority));

        assert_eq!(ids(&view), vec![1, 2]);
    }

    #[test]
    fn priority_sort_places_none_last() {
        let tasks = vec![
            task(1, "2024-01-01", "23:59:00", Priority::None, false),
            task(2, "2024-01-01", "23:59:00", Priority::Low, false),
            task(3, "2024-01-01", "23:59:00", Priority::High, false),
            task(4, "2024-01-01", "23:59:00", Priority::Medium, false),
        ];

        let view = derive_view(&tasks, &prefs(SortType::Priority));

        assert_eq!(ids(&view), vec![3, 4, 2, 1]);
    }

    #[test]
    fn added_sort_follows_creation_order() {
        let tasks = vec![
            task(1, "2024-06-01", "23:59:00", Priority::Low, false),
            task(2, "2024-01-01", "23:59:00", Priority::High, false),
            task(3, "2024-03-01", "23:59:00", Priority::Medium, false),
        ];

        let view = derive_view(&tasks, &prefs(SortType::Added));

        assert_eq!(ids(&view), vec![1, 2, 3]);
    }

    #[test]
    fn equal_keys_preserve_insertion_order() {
        // Three tasks indistinguishable by every sort key.
        let tasks = vec![
            task(1, "2024-01-01", "23:59:00", Priority::Medium, false),
            task(2, "2024-01-01", "23:59:00", Priority::Medium, false),
            task(3, "2024-01-01", "23:59:00", Priority::Medium, false),
        ];

        for sort in [SortType::Date, SortType::Priority, SortType::Added] {
            let view = derive_view(&tasks, &prefs(sort));
            assert_eq!(ids(&view), vec![1, 2, 3], "unstable under {sort} sort");
        }
    }

    #[test]
    fn filter_retains_only_the_matching_priority() {
        let tasks = vec![
            task(1, "2024-01-01", "23:59:00", Priority::High, false),
            task(2, "2024-01-01", "23:59:00", Priority::Low, false),
            task(3, "2024-01-01", "23:59:00", Priority::High, false),
            task(4, "2024-01-01", "23:59:00", Priority::None, false),
        ];
        let prefs = ViewPreferences {
            filter: PriorityFilter::Only(Priority::High),
            ..ViewPreferences::default()
        };

        let view = derive_view(&tasks, &prefs);

        assert_eq!(ids(&view), vec![1, 3]);
    }

    #[test]
    fn filter_with_no_matching_tasks_is_empty() {
        let tasks = vec![
            task(1, "2024-01-01", "23:59:00", Priority::High, false),
            task(2, "2024-01-01", "23:59:00", Priority::None, false),
        ];
        let prefs = ViewPreferences {
            filter: PriorityFilter::Only(Priority::Medium),
            ..ViewPreferences::default()
        };

        let view = derive_view(&tasks, &prefs);

        assert!(view.is_empty());
    }

    #[test]
    fn completed_tasks_group_first_when_requested() {
        // Identical sort keys, so the post-sort order is A, B, C.
        let tasks = vec![
            task(1, "2024-01-01", "23:59:00", Priority::None, false),
            task(2, "2024-01-01", "23:59:00", Priority::None, true),
            task(3, "2024-01-01", "23:59:00", Priority::None, false),
        ];
        let prefs = ViewPreferences {
            completed_first: true,
            ..ViewPreferences::default()
        };

        let view = derive_view(&tasks, &prefs);

        assert_eq!(ids(&view), vec![2, 1, 3]);
    }

    #[test]
    fn open_tasks_group_first_when_requested() {
        let tasks = vec![
            task(1, "2024-01-01", "23:59:00", Priority::None, false),
            task(2, "2024-01-01", "23:59:00", Priority::None, true),
            task(3, "2024-01-01", "23:59:00", Priority::None, false),
        ];
        let prefs = ViewPreferences {
            completed_first: false,
            ..ViewPreferences::default()
        };

        let view = derive_view(&tasks, &prefs);

        assert_eq!(ids(&view), vec![1, 3, 2]);
    }

    #[test]
    fn grouping_preserves_each_groups_sorted_order() {
        let tasks = vec![
            task(1, "2024-01-03", "23:59:00", Priority::None, true),
            task(2, "2024-01-01", "23:59:00", Priority::None, false),
            task(3, "2024-01-02", "23:59:00", Priority::None, true),
            task(4, "2024-01-04", "23:59:00", Priority::None, false),
        ];
        let prefs = ViewPreferences {
            sort: SortType::Date,
            completed_first: true,
            ..ViewPreferences::default()
        };

        let view = derive_view(&tasks, &prefs);

        // Completed tasks by date, then open tasks by date.
        assert_eq!(ids(&view), vec![3, 1, 2, 4]);
    }

    #[test]
    fn filter_sort_and_grouping_compose() {
        let tasks = vec![
            task(1, "2024-01-05", "23:59:00", Priority::High, false),
            task(2, "2024-01-01", "23:59:00", Priority::Low, false),
            task(3, "2024-01-03", "23:59:00", Priority::High, true),
            task(4, "2024-01-02", "23:59:00", Priority::High, false),
        ];
        let prefs = ViewPreferences {
            sort: SortType::Date,
            filter: PriorityFilter::Only(Priority::High),
            completed_first: true,
        };

        let view = derive_view(&tasks, &prefs);

        assert_eq!(ids(&view), vec![3, 4, 1]);
    }

    #[test]
    fn derive_view_is_idempotent() {
        let tasks = vec![
            task(1, "2024-01-02", "08:00:00", Priority::High, true),
            task(2, "2024-01-01", "23:59:00", Priority::Low, false),
            task(3, "2024-01-03", "12:00:00", Priority::None, false),
        ];
        let prefs = ViewPreferences::default();

        let first = ids(&derive_view(&tasks, &prefs));
        let second = ids(&derive_view(&tasks, &prefs));

        assert_eq!(first, second);
    }

    #[test]
    fn sort_type_parses_from_its_display_form() {
        for sort in [SortType::Date, SortType::Priority, SortType::Added] {
            assert_eq!(sort.to_string().parse::<SortType>(), Ok(sort));
        }
    }

    #[test]
    fn unknown_sort_order_is_rejected() {
        assert_eq!(
            "alphabetical".parse::<SortType>(),
            Err(PreferenceError::UnknownSortOrder("alphabetical".to_string()))
        );
    }

    #[test]
    fn priority_filter_parses_all_and_each_priority() {
        assert_eq!("all".parse::<PriorityFilter>(), Ok(PriorityFilter::All));
        assert_eq!(
            "high".parse::<PriorityFilter>(),
            Ok(PriorityFilter::Only(Priority::High))
        );
        assert_eq!(
            "none".parse::<PriorityFilter>(),
            Ok(PriorityFilter::Only(Priority::None))
        );
    }

    #[test]
    fn unknown_priority_filter_is_rejected() {
        assert_eq!(
            "urgent".parse::<PriorityFilter>(),
            Err(PreferenceError::UnknownFilter("urgent".to_string()))
        );
    }
}
