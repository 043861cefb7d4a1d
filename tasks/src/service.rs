//! Task-service collaborator.
//!
//! The remote service that owns tasks. Effects reach it through the
//! [`TaskService`] trait object held by the environment; the store itself
//! never calls it.

use crate::types::{Task, TaskId, TaskMap, TaskPatch};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Boxed future returned by [`TaskService`] methods
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TaskServiceError>> + Send + 'a>>;

/// Errors reported by the task service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskServiceError {
    /// The service could not be reached or is temporarily failing.
    #[error("Task service unavailable: {0}")]
    Unavailable(String),

    /// The task does not exist on the service.
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    /// The service refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl TaskServiceError {
    /// Returns true if retrying the same call may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// One page of tasks
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    /// Tasks on this page, in service order
    pub items: Vec<Task>,
    /// Cursor of the following page; `None` on the last page
    pub next_page_token: Option<String>,
}

/// Which service call an outcome belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceOperation {
    /// `list_tasks`
    ListTasks,
    /// `update_task`
    UpdateTask,
    /// `delete_task`
    DeleteTask,
}

impl ServiceOperation {
    /// Stable name, used as a metrics label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListTasks => "list_tasks",
            Self::UpdateTask => "update_task",
            Self::DeleteTask => "delete_task",
        }
    }
}

impl std::fmt::Display for ServiceOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote task service
///
/// # Dyn Compatibility
///
/// Methods return boxed futures so the service can be held as
/// `Arc<dyn TaskService>` and moved into spawned effects.
pub trait TaskService: Send + Sync {
    /// Fetch one page of tasks; `None` requests the first page.
    ///
    /// # Errors
    ///
    /// - `Unavailable`: the service could not be reached
    /// - `Rejected`: the cursor is not valid
    fn list_tasks(&self, page_token: Option<String>) -> ServiceFuture<'_, TaskPage>;

    /// Apply a partial update to a task.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no task with this id
    /// - `Unavailable`: the service could not be reached
    fn update_task(&self, id: TaskId, patch: TaskPatch) -> ServiceFuture<'_, ()>;

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// - `NotFound`: no task with this id
    /// - `Unavailable`: the service could not be reached
    fn delete_task(&self, id: TaskId) -> ServiceFuture<'_, ()>;
}

/// A call received by [`InMemoryTaskService`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServiceCall {
    /// `list_tasks(page_token)`
    ListTasks(Option<String>),
    /// `update_task(id, patch)`
    UpdateTask(TaskId, TaskPatch),
    /// `delete_task(id)`
    DeleteTask(TaskId),
}

#[derive(Default)]
struct ServiceData {
    tasks: TaskMap,
    calls: Vec<ServiceCall>,
    failures: Vec<(ServiceOperation, TaskServiceError)>,
}

/// In-memory task service
///
/// Pages are cut at a fixed size and addressed by the offset of their first
/// task, so the cursor `"2"` starts at the third task. Every call is recorded
/// and queued failures are returned before touching the data, which makes
/// the service suitable for tests and the demo.
pub struct InMemoryTaskService {
    data: Mutex<ServiceData>,
    page_size: usize,
    latency: Duration,
}

impl InMemoryTaskService {
    /// Default number of tasks per page
    pub const DEFAULT_PAGE_SIZE: usize = 20;

    /// Creates an empty service
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Mutex::new(ServiceData::default()),
            page_size: Self::DEFAULT_PAGE_SIZE,
            latency: Duration::ZERO,
        }
    }

    /// Creates a service holding `tasks` in the given order
    #[must_use]
    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let service = Self::new();
        service.data.lock().tasks = tasks.into_iter().map(|task| (task.id.clone(), task)).collect();
        service
    }

    /// Sets the page size (at least one)
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delays every call by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queues a failure for the next call of `operation`
    ///
    /// Queued failures are consumed first-in, first-out.
    pub fn fail_next(&self, operation: ServiceOperation, error: TaskServiceError) {
        self.data.lock().failures.push((operation, error));
    }

    /// Every call received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<ServiceCall> {
        self.data.lock().calls.clone()
    }

    /// Current contents, in order
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.data.lock().tasks.values().cloned().collect()
    }

    fn record(&self, call: ServiceCall, operation: ServiceOperation) -> Result<(), TaskServiceError> {
        let mut data = self.data.lock();
        data.calls.push(call);

        let queued = data.failures.iter().position(|(op, _)| *op == operation);
        match queued.map(|index| data.failures.remove(index)) {
            Some((_, error)) => Err(error),
            None => Ok(()),
        }
    }

    fn page(&self, page_token: Option<&str>) -> Result<TaskPage, TaskServiceError> {
        let start = match page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| TaskServiceError::Rejected(format!("invalid page token {token:?}")))?,
        };

        let data = self.data.lock();
        let end = start.saturating_add(self.page_size).min(data.tasks.len());
        let items = data
            .tasks
            .values()
            .skip(start)
            .take(end.saturating_sub(start))
            .cloned()
            .collect();
        let next_page_token = (end < data.tasks.len()).then(|| end.to_string());

        Ok(TaskPage {
            items,
            next_page_token,
        })
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl Default for InMemoryTaskService {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskService for InMemoryTaskService {
    fn list_tasks(&self, page_token: Option<String>) -> ServiceFuture<'_, TaskPage> {
        Box::pin(async move {
            self.simulate_latency().await;
            self.record(ServiceCall::ListTasks(page_token.clone()), ServiceOperation::ListTasks)?;
            self.page(page_token.as_deref())
        })
    }

    fn update_task(&self, id: TaskId, patch: TaskPatch) -> ServiceFuture<'_, ()> {
        Box::pin(async move {
            self.simulate_latency().await;
            self.record(
                ServiceCall::UpdateTask(id.clone(), patch.clone()),
                ServiceOperation::UpdateTask,
            )?;

            let mut data = self.data.lock();
            let task = data
                .tasks
                .get_mut(&id)
                .ok_or_else(|| TaskServiceError::NotFound(id.clone()))?;
            if let Some(updated) = patch.apply(task) {
                *task = updated;
            }
            Ok(())
        })
    }

    fn delete_task(&self, id: TaskId) -> ServiceFuture<'_, ()> {
        Box::pin(async move {
            self.simulate_latency().await;
            self.record(ServiceCall::DeleteTask(id.clone()), ServiceOperation::DeleteTask)?;

            self.data
                .lock()
                .tasks
                .shift_remove(&id)
                .map(|_| ())
                .ok_or(TaskServiceError::NotFound(id))
        })
    }
}
