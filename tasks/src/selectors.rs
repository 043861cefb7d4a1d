//! Read-side selectors over [`RootState`].
//!
//! Selectors never fail: a missing task is reported as `None`.

use crate::types::{LoadStatus, RootState, Task, TaskMap};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// The task stored under `id`, if any
#[must_use]
pub fn get_task_by_id<'a>(state: &'a RootState, id: &str) -> Option<&'a Task> {
    state.tasks.items.get(id)
}

/// Lifecycle status of the tasks collection
#[must_use]
pub fn get_load_status(state: &RootState) -> LoadStatus {
    state.tasks.status
}

/// Cursor of the next page, if there is one
#[must_use]
pub fn get_next_page_token(state: &RootState) -> Option<&str> {
    state.tasks.next_page_token.as_deref()
}

/// Current new-task draft
#[must_use]
pub fn get_new_task_text(state: &RootState) -> &str {
    &state.new_task.text
}

/// Returns true when a page has loaded and the service announced another one
#[must_use]
pub fn has_more_pages(state: &RootState) -> bool {
    state.tasks.status == LoadStatus::Loaded && state.tasks.next_page_token.is_some()
}

/// Creates an independent memoized [`GetTasks`] selector
#[must_use]
pub fn make_get_tasks() -> GetTasks {
    GetTasks::default()
}

struct Memo {
    last_input: Weak<TaskMap>,
    last_output: Arc<[Task]>,
}

/// Memoized selector returning every task in insertion order
///
/// Holds a single-slot cache keyed on the identity of the tasks collection:
/// selecting against the same collection allocation returns the cached
/// slice, so consumers can compare results with [`Arc::ptr_eq`]. Only a
/// `Weak` reference to the collection is kept.
#[derive(Default)]
pub struct GetTasks {
    memo: Mutex<Option<Memo>>,
}

impl GetTasks {
    /// Tasks of `state` in insertion order
    #[must_use]
    pub fn select(&self, state: &RootState) -> Arc<[Task]> {
        let items = &state.tasks.items;
        let mut memo = self.memo.lock();

        let hit = memo.as_ref().filter(|cached| {
            cached
                .last_input
                .upgrade()
                .is_some_and(|last| Arc::ptr_eq(&last, items))
        });
        if let Some(cached) = hit {
            return Arc::clone(&cached.last_output);
        }

        let output: Arc<[Task]> = items.values().cloned().collect();
        *memo = Some(Memo {
            last_input: Arc::downgrade(items),
            last_output: Arc::clone(&output),
        });
        output
    }
}

impl std::fmt::Debug for GetTasks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self.memo.lock().as_ref().map(|memo| memo.last_output.len());
        f.debug_struct("GetTasks").field("cached", &cached).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TasksState;

    fn loaded(tasks: impl IntoIterator<Item = Task>) -> RootState {
        RootState::with_tasks(TasksState::loaded(tasks, None))
    }

    #[test]
    fn gets_the_task_when_it_is_there() {
        let state = loaded([Task::new("a", "foo", false)]);
        assert_eq!(get_task_by_id(&state, "a"), Some(&Task::new("a", "foo", false)));
    }

    #[test]
    fn returns_none_when_there_is_no_task() {
        assert_eq!(get_task_by_id(&RootState::new(), "a"), None);
    }

    #[test]
    fn gets_a_list_in_order() {
        let get_tasks = make_get_tasks();
        let state = loaded([Task::new("a", "foo", false), Task::new("b", "bar", true)]);

        assert_eq!(
            &*get_tasks.select(&state),
            &[Task::new("a", "foo", false), Task::new("b", "bar", true)]
        );
    }

    #[test]
    fn gets_an_empty_list_from_an_empty_state() {
        assert!(make_get_tasks().select(&loaded([])).is_empty());
    }

    #[test]
    fn unchanged_collection_returns_cached_slice() {
        let get_tasks = make_get_tasks();
        let state = loaded([Task::new("a", "foo", false)]);

        let first = get_tasks.select(&state);
        let second = get_tasks.select(&state);
        assert!(Arc::ptr_eq(&first, &second));

        // A different root around the same collection still hits the cache
        let draft_changed = RootState {
            tasks: Arc::clone(&state.tasks),
            new_task: Arc::default(),
        };
        assert!(Arc::ptr_eq(&first, &get_tasks.select(&draft_changed)));
    }

    #[test]
    fn new_collection_invalidates_cache() {
        let get_tasks = make_get_tasks();
        let first = get_tasks.select(&loaded([Task::new("a", "foo", false)]));
        let second = get_tasks.select(&loaded([Task::new("a", "foo", true)]));

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second[0].is_complete);
    }

    #[test]
    fn factories_yield_independent_caches() {
        let a = make_get_tasks();
        let b = make_get_tasks();
        let state_one = loaded([Task::new("a", "foo", false)]);
        let state_two = loaded([Task::new("b", "bar", false)]);

        let from_a = a.select(&state_one);
        let _ = b.select(&state_two);

        assert!(Arc::ptr_eq(&from_a, &a.select(&state_one)));
    }

    #[test]
    fn pagination_readers() {
        let mut tasks = TasksState::loaded([Task::new("a", "foo", false)], Some("abc".to_string()));
        let state = RootState::with_tasks(tasks.clone());
        assert!(has_more_pages(&state));
        assert_eq!(get_next_page_token(&state), Some("abc"));
        assert_eq!(get_load_status(&state), LoadStatus::Loaded);
        assert_eq!(get_new_task_text(&state), "");

        tasks.next_page_token = None;
        assert!(!has_more_pages(&RootState::with_tasks(tasks)));
    }
}
