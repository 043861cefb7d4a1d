//! Event vocabulary of the task list.
//!
//! Events are tagged values. On the wire they are JSON objects carrying a
//! `"type"` tag (`"RELOAD_TASKS"`, `"TASKS_RECEIVED"`, ...); any tag this
//! vocabulary does not know decodes to [`TaskAction::Unknown`], which every
//! part of the pipeline treats as a no-op.
//!
//! Build events with the constructor functions in this module.

use crate::service::ServiceOperation;
use crate::types::{Task, TaskId, TaskPatch};
use serde::{Deserialize, Serialize};
use tasklist_macros::Action;

/// Commands and events for the task list
#[derive(Action, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum TaskAction {
    // ========== Commands ==========
    /// Command: fetch the page at `page_token` (`None` for the first page)
    #[command]
    LoadNextPage {
        /// Cursor of the page to fetch
        #[serde(default)]
        page_token: Option<String>,
    },

    /// Command: clear the collection and fetch it again from the first page
    #[command]
    ReloadTasks,

    /// Command: shallow-merge `patch` into a task and persist it
    #[command]
    EditTask {
        /// Task to edit
        id: TaskId,
        /// Fields to change
        patch: TaskPatch,
    },

    /// Command: remove a task and persist the removal
    #[command]
    DeleteTask {
        /// Task to delete
        id: TaskId,
    },

    /// Command: replace the new-task draft
    #[command]
    EditNewTaskText {
        /// Draft text
        text: String,
    },

    // ========== Events ==========
    /// Event: a page of tasks arrived from the service
    #[event]
    TasksReceived {
        /// Tasks on the page, in service order
        items: Vec<Task>,
        /// Cursor of the following page
        #[serde(default)]
        next_page_token: Option<String>,
    },

    /// Event: a task-service call failed after retries
    #[event]
    TaskServiceFailed {
        /// The call that failed
        operation: ServiceOperation,
        /// Error description
        message: String,
    },

    /// Any event this vocabulary does not recognise
    #[serde(other)]
    Unknown,
}

/// `ReloadTasks`
#[must_use]
pub const fn reload_tasks() -> TaskAction {
    TaskAction::ReloadTasks
}

/// `TasksReceived { items, next_page_token }`
#[must_use]
pub fn tasks_received(items: Vec<Task>, next_page_token: Option<String>) -> TaskAction {
    TaskAction::TasksReceived {
        items,
        next_page_token,
    }
}

/// `EditTask { id, patch }`
#[must_use]
pub fn edit_task(id: impl Into<TaskId>, patch: TaskPatch) -> TaskAction {
    TaskAction::EditTask {
        id: id.into(),
        patch,
    }
}

/// `DeleteTask { id }`
#[must_use]
pub fn delete_task(id: impl Into<TaskId>) -> TaskAction {
    TaskAction::DeleteTask { id: id.into() }
}

/// `EditNewTaskText { text }`
#[must_use]
pub fn edit_new_task_text(text: impl Into<String>) -> TaskAction {
    TaskAction::EditNewTaskText { text: text.into() }
}

/// `LoadNextPage { page_token }`
#[must_use]
pub const fn load_next_page(page_token: Option<String>) -> TaskAction {
    TaskAction::LoadNextPage { page_token }
}
