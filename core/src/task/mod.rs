use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Urgency label attached to every task.
///
/// Variant order is the sort rank: `High` orders before `Medium`, down to
/// `None` last.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    None,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::None => "none",
        };
        f.write_str(label)
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            "none" => Ok(Priority::None),
            other => Err(TaskError::UnknownPriority(other.to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("unknown priority `{0}`, expected one of: high, medium, low, none")]
    UnknownPriority(String),
}

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Task {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub due_time: NaiveTime,
    pub priority: Priority,
    pub completed: bool,
}

impl Task {
    /// The combined due instant used for date ordering.
    pub fn due_at(&self) -> NaiveDateTime {
        self.due_date.and_time(self.due_time)
    }
}

/// Creation input for a task. Any field may be left empty; missing values
/// are filled in by [`TaskStore::add`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskDraft {
    pub name: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<NaiveTime>,
    pub priority: Option<Priority>,
}

/// Owns the session's tasks. The backing `Vec` is append-only with respect
/// to ordering, so slice order is always creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskStore {
    tasks: Vec<Task>,
    next_id: u32,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
        }
    }

    /// Creates a task from the draft and appends it to the collection.
    ///
    /// Missing fields default here, exactly once: the due date to the
    /// current day, the due time to 23:59, the priority to
    /// [`Priority::None`]. Returns the fully-populated task.
    pub fn add(&mut self, draft: TaskDraft) -> Task {
        let task = Task {
            id: self.next_id,
            name: draft.name,
            description: draft.description,
            due_date: draft.due_date.unwrap_or_else(|| Utc::now().date_naive()),
            due_time: draft.due_time.unwrap_or_else(default_due_time),
            priority: draft.priority.unwrap_or_default(),
            completed: false,
        };
        self.next_id += 1;
        self.tasks.push(task.clone());
        task
    }

    /// Removes the task with the given id, reporting whether anything was
    /// removed. Unknown ids are a no-op, so the operation is idempotent.
    pub fn delete(&mut self, id: u32) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.tasks.len() < before
    }

    /// Flips the completed flag of the task with the given id and returns
    /// the new value, or `None` if no task matches.
    pub fn toggle_completed(&mut self, id: u32) -> Option<bool> {
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        task.completed = !task.completed;
        Some(task.completed)
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// All tasks, in creation order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// End of day, the fallback when a draft carries no due time.
fn default_due_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).expect("23:59 is a valid time of day")
}
