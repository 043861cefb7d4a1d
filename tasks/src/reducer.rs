//! Reducer logic for the task list.
//!
//! The root reducer is assembled from one reducer per state slice:
//! [`TasksReducer`] owns [`RootState::tasks`] and [`NewTaskReducer`] owns
//! [`RootState::new_task`]. Each returns its input `Arc` for events it does
//! not act on, and the composition hands back the root `Arc` unchanged when
//! no slice changed.

use crate::actions::TaskAction;
use crate::types::{LoadStatus, NewTask, RootState, Task, TaskId, TaskPatch, TasksState};
use std::sync::Arc;
use tasklist_core::composition::{BoxedReducer, CombinedReducer, combine_reducers, scope_reducer};
use tasklist_core::reducer::Reducer;

/// The composed reducer over [`RootState`]
pub type RootReducer = CombinedReducer<RootState, TaskAction>;

/// Builds the root reducer
#[must_use]
pub fn root_reducer() -> RootReducer {
    let tasks: BoxedReducer<RootState, TaskAction> =
        Box::new(scope_reducer(TasksReducer, tasks_slice, with_tasks_slice));
    let new_task: BoxedReducer<RootState, TaskAction> =
        Box::new(scope_reducer(NewTaskReducer, new_task_slice, with_new_task_slice));

    combine_reducers(vec![tasks, new_task])
}

fn tasks_slice(state: &RootState) -> &Arc<TasksState> {
    &state.tasks
}

fn with_tasks_slice(state: &RootState, tasks: Arc<TasksState>) -> RootState {
    RootState {
        tasks,
        new_task: Arc::clone(&state.new_task),
    }
}

fn new_task_slice(state: &RootState) -> &Arc<NewTask> {
    &state.new_task
}

fn with_new_task_slice(state: &RootState, new_task: Arc<NewTask>) -> RootState {
    RootState {
        tasks: Arc::clone(&state.tasks),
        new_task,
    }
}

/// Reducer for the tasks slice
#[derive(Clone, Copy, Debug, Default)]
pub struct TasksReducer;

impl TasksReducer {
    fn reload(state: &Arc<TasksState>) -> Arc<TasksState> {
        if state.status == LoadStatus::Loading
            && state.items.is_empty()
            && state.next_page_token.is_none()
        {
            return Arc::clone(state);
        }

        Arc::new(TasksState {
            status: LoadStatus::Loading,
            items: Arc::default(),
            next_page_token: None,
        })
    }

    fn receive(
        state: &Arc<TasksState>,
        items: &[Task],
        next_page_token: Option<&String>,
    ) -> Arc<TasksState> {
        let items_changed = items
            .iter()
            .any(|task| state.items.get(&task.id) != Some(task));

        if !items_changed
            && state.status == LoadStatus::Loaded
            && state.next_page_token.as_ref() == next_page_token
        {
            return Arc::clone(state);
        }

        let merged = if items_changed {
            let mut merged = (*state.items).clone();
            for task in items {
                // Existing ids keep their position
                merged.insert(task.id.clone(), task.clone());
            }
            Arc::new(merged)
        } else {
            Arc::clone(&state.items)
        };

        Arc::new(TasksState {
            status: LoadStatus::Loaded,
            items: merged,
            next_page_token: next_page_token.cloned(),
        })
    }

    fn edit(state: &Arc<TasksState>, id: &TaskId, patch: &TaskPatch) -> Arc<TasksState> {
        let Some(updated) = state.items.get(id).and_then(|task| patch.apply(task)) else {
            return Arc::clone(state);
        };

        let mut items = (*state.items).clone();
        items.insert(id.clone(), updated);

        Arc::new(TasksState {
            status: state.status,
            items: Arc::new(items),
            next_page_token: state.next_page_token.clone(),
        })
    }

    fn delete(state: &Arc<TasksState>, id: &TaskId) -> Arc<TasksState> {
        if !state.items.contains_key(id) {
            return Arc::clone(state);
        }

        let mut items = (*state.items).clone();
        items.shift_remove(id);

        Arc::new(TasksState {
            status: state.status,
            items: Arc::new(items),
            next_page_token: state.next_page_token.clone(),
        })
    }
}

impl Reducer for TasksReducer {
    type State = TasksState;
    type Action = TaskAction;

    fn reduce(&self, state: &Arc<TasksState>, action: &TaskAction) -> Arc<TasksState> {
        match action {
            TaskAction::ReloadTasks => Self::reload(state),
            TaskAction::TasksReceived {
                items,
                next_page_token,
            } => Self::receive(state, items, next_page_token.as_ref()),
            TaskAction::EditTask { id, patch } => Self::edit(state, id, patch),
            TaskAction::DeleteTask { id } => Self::delete(state, id),
            TaskAction::LoadNextPage { .. }
            | TaskAction::EditNewTaskText { .. }
            | TaskAction::TaskServiceFailed { .. }
            | TaskAction::Unknown => Arc::clone(state),
        }
    }
}

/// Reducer for the new-task draft
#[derive(Clone, Copy, Debug, Default)]
pub struct NewTaskReducer;

impl Reducer for NewTaskReducer {
    type State = NewTask;
    type Action = TaskAction;

    fn reduce(&self, state: &Arc<NewTask>, action: &TaskAction) -> Arc<NewTask> {
        match action {
            TaskAction::EditNewTaskText { text } if *text != state.text => {
                Arc::new(NewTask { text: text.clone() })
            },
            _ => Arc::clone(state),
        }
    }
}
