//! Task-list state container.
//!
//! Holds an in-memory projection of server-backed tasks, applies pure state
//! transitions for task events and runs the task-service calls those events
//! trigger.
//!
//! - [`types`]: the state tree (`RootState`, `TasksState`, `Task`, ...)
//! - [`actions`]: the event vocabulary and its constructors
//! - [`reducer`]: the composed root reducer
//! - [`selectors`]: read-side queries, including the memoized [`GetTasks`]
//! - [`service`]: the task-service collaborator and an in-memory implementation
//! - [`effects`]: handlers turning events into service calls
//! - [`store`]: `configure_store`
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tasks::{InMemoryTaskService, Task, TaskEnvironment, configure_store, make_get_tasks, reload_tasks};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = InMemoryTaskService::with_tasks([Task::new("a", "Buy milk", false)]);
//! let store = configure_store(None, TaskEnvironment::new(Arc::new(service)));
//!
//! store.dispatch(reload_tasks());
//! store.settle(Duration::from_secs(1)).await?;
//!
//! let get_tasks = make_get_tasks();
//! for task in get_tasks.select(&store.get_state()).iter() {
//!     println!("[{}] {}", if task.is_complete { "x" } else { " " }, task.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod effects;
pub mod reducer;
pub mod selectors;
pub mod service;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use actions::{
    TaskAction, delete_task, edit_new_task_text, edit_task, load_next_page, reload_tasks,
    tasks_received,
};
pub use config::{ConfigError, TasksConfig};
pub use effects::{TaskEnvironment, root_effects};
pub use reducer::{NewTaskReducer, RootReducer, TasksReducer, root_reducer};
pub use selectors::{
    GetTasks, get_load_status, get_new_task_text, get_next_page_token, get_task_by_id,
    has_more_pages, make_get_tasks,
};
pub use service::{InMemoryTaskService, TaskPage, TaskService, TaskServiceError};
pub use store::{TaskStore, configure_default_store, configure_store};
pub use types::{LoadStatus, NewTask, RootState, Task, TaskId, TaskPatch, TasksState};
