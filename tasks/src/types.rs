//! Domain types for the task list.
//!
//! The state tree is immutable and shared through `Arc`s: every transition
//! builds new nodes for the parts that changed and reuses the rest, so
//! pointer comparison tells readers which parts of the tree are untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::sync::Arc;

/// Identifier of a task, assigned by the task service
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a `TaskId` from any string
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single task
///
/// Serialized with the task service's field names (`_id`, `text`, `isComplete`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Description of the task
    pub text: String,
    /// Whether the task is done
    pub is_complete: bool,
}

impl Task {
    /// Creates a new task
    #[must_use]
    pub fn new(id: impl Into<TaskId>, text: impl Into<String>, is_complete: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_complete,
        }
    }
}

/// Partial update of a task; absent fields are left as they are
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// New text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// New completion flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
}

impl TaskPatch {
    /// A patch that only sets the completion flag
    #[must_use]
    pub const fn complete(is_complete: bool) -> Self {
        Self {
            text: None,
            is_complete: Some(is_complete),
        }
    }

    /// A patch that only sets the text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            is_complete: None,
        }
    }

    /// Returns true if the patch sets no field
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_none() && self.is_complete.is_none()
    }

    /// Shallow-merges the patch into `task`
    ///
    /// Returns `None` when the result would equal `task`.
    #[must_use]
    pub fn apply(&self, task: &Task) -> Option<Task> {
        let text = self.text.as_ref().filter(|text| **text != task.text);
        let is_complete = self.is_complete.filter(|done| *done != task.is_complete);

        if text.is_none() && is_complete.is_none() {
            return None;
        }

        Some(Task {
            id: task.id.clone(),
            text: text.cloned().unwrap_or_else(|| task.text.clone()),
            is_complete: is_complete.unwrap_or(task.is_complete),
        })
    }
}

/// Lifecycle of the tasks collection
///
/// `Unloaded -> Loading -> Loaded`, and back to `Loading` on every reload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    /// Nothing requested yet
    #[default]
    Unloaded,
    /// A reload cleared the collection and the first page is pending
    Loading,
    /// At least one page has been received
    Loaded,
}

/// Insertion-ordered tasks, keyed by id
pub type TaskMap = IndexMap<TaskId, Task>;

/// The tasks slice of the root state
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksState {
    /// Where the collection is in its lifecycle
    pub status: LoadStatus,
    /// Every known task in arrival order
    pub items: Arc<TaskMap>,
    /// Cursor of the next page; `None` when there are no further pages
    pub next_page_token: Option<String>,
}

impl TasksState {
    /// Creates an empty, unloaded tasks slice
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A loaded slice holding `tasks` in the given order
    #[must_use]
    pub fn loaded(tasks: impl IntoIterator<Item = Task>, next_page_token: Option<String>) -> Self {
        Self {
            status: LoadStatus::Loaded,
            items: Arc::new(tasks.into_iter().map(|task| (task.id.clone(), task)).collect()),
            next_page_token,
        }
    }

    /// Number of tasks
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no tasks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if a task with `id` is present
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    /// Lifecycle status
    #[must_use]
    pub const fn status(&self) -> LoadStatus {
        self.status
    }
}

/// Draft of the task being typed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Text typed so far
    pub text: String,
}

/// The complete state tree held by the store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootState {
    /// Server-backed tasks
    pub tasks: Arc<TasksState>,
    /// New-task draft
    pub new_task: Arc<NewTask>,
}

impl RootState {
    /// The initial state: unloaded, no tasks, empty draft
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Root state around the given tasks slice, with an empty draft
    #[must_use]
    pub fn with_tasks(tasks: TasksState) -> Self {
        Self {
            tasks: Arc::new(tasks),
            new_task: Arc::default(),
        }
    }
}
