//! Core task collection logic for the to-do list: the task store and the
//! pure view pipeline that orders tasks for display.
pub mod task;
pub mod view;

pub use task::{Priority, Task, TaskDraft, TaskError, TaskStore};
pub use view::{PreferenceError, PriorityFilter, SortType, ViewPreferences, derive_view};
