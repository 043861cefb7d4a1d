//! Effect handlers: task-service calls triggered by task events.
//!
//! | Event | Service call | Emits |
//! |---|---|---|
//! | `LoadNextPage` | `list_tasks(page_token)` | `TasksReceived` |
//! | `ReloadTasks` | `list_tasks(None)` | `TasksReceived` |
//! | `EditTask` | `update_task(id, patch)` | nothing |
//! | `DeleteTask` | `delete_task(id)` | nothing |
//!
//! Each call is retried while the service reports a transient error. A call
//! that still fails emits `TaskServiceFailed` from its own effect only.

use crate::actions::{TaskAction, tasks_received};
use crate::service::{ServiceOperation, TaskService, TaskServiceError};
use crate::types::{TaskId, TaskPatch};
use std::sync::Arc;
use tasklist_core::effect::Effect;
use tasklist_core::handler::EffectHandler;
use tasklist_runtime::EffectCoordinator;
use tasklist_runtime::retry::{RetryPolicy, retry_with_predicate};

/// Environment dependencies for task effects
#[derive(Clone)]
pub struct TaskEnvironment {
    /// Remote task service
    pub service: Arc<dyn TaskService>,
    /// Retry policy for service calls
    pub retry_policy: RetryPolicy,
}

impl TaskEnvironment {
    /// Creates an environment with the default retry policy
    #[must_use]
    pub fn new(service: Arc<dyn TaskService>) -> Self {
        Self {
            service,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

impl std::fmt::Debug for TaskEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEnvironment")
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

/// The task coordinator: every task handler registered against `env`
#[must_use]
pub fn root_effects(env: TaskEnvironment) -> EffectCoordinator<TaskAction, TaskEnvironment> {
    EffectCoordinator::new(env)
        .with_handler(LoadNextPageHandler)
        .with_handler(ReloadTasksHandler)
        .with_handler(PersistEditHandler)
        .with_handler(PersistDeleteHandler)
}

fn service_failed(operation: ServiceOperation, error: &TaskServiceError) -> TaskAction {
    metrics::counter!("coordinator.effects.failed", "operation" => operation.as_str()).increment(1);
    TaskAction::TaskServiceFailed {
        operation,
        message: error.to_string(),
    }
}

fn fetch_page(env: &TaskEnvironment, page_token: Option<String>) -> Effect<TaskAction> {
    let service = Arc::clone(&env.service);
    let policy = env.retry_policy.clone();

    Effect::future(async move {
        let result = retry_with_predicate(
            &policy,
            || service.list_tasks(page_token.clone()),
            TaskServiceError::is_transient,
        )
        .await;

        match result {
            Ok(page) => {
                tracing::debug!(
                    page_token = page_token.as_deref(),
                    items = page.items.len(),
                    next_page_token = page.next_page_token.as_deref(),
                    "Page received"
                );
                Some(tasks_received(page.items, page.next_page_token))
            },
            Err(error) => {
                tracing::warn!(page_token = page_token.as_deref(), %error, "Failed to list tasks");
                Some(service_failed(ServiceOperation::ListTasks, &error))
            },
        }
    })
}

/// `LoadNextPage` fetches the requested page
#[derive(Clone, Copy, Debug, Default)]
pub struct LoadNextPageHandler;

impl EffectHandler for LoadNextPageHandler {
    type Action = TaskAction;
    type Environment = TaskEnvironment;

    fn kind(&self) -> &'static str {
        "LoadNextPage"
    }

    fn handle(&self, action: &TaskAction, env: &TaskEnvironment) -> Effect<TaskAction> {
        let TaskAction::LoadNextPage { page_token } = action else {
            return Effect::None;
        };
        fetch_page(env, page_token.clone())
    }
}

/// `ReloadTasks` fetches the first page
#[derive(Clone, Copy, Debug, Default)]
pub struct ReloadTasksHandler;

impl EffectHandler for ReloadTasksHandler {
    type Action = TaskAction;
    type Environment = TaskEnvironment;

    fn kind(&self) -> &'static str {
        "ReloadTasks"
    }

    fn handle(&self, action: &TaskAction, env: &TaskEnvironment) -> Effect<TaskAction> {
        if !matches!(action, TaskAction::ReloadTasks) {
            return Effect::None;
        }
        fetch_page(env, None)
    }
}

/// `EditTask` persists the patch
#[derive(Clone, Copy, Debug, Default)]
pub struct PersistEditHandler;

impl EffectHandler for PersistEditHandler {
    type Action = TaskAction;
    type Environment = TaskEnvironment;

    fn kind(&self) -> &'static str {
        "EditTask"
    }

    fn handle(&self, action: &TaskAction, env: &TaskEnvironment) -> Effect<TaskAction> {
        let TaskAction::EditTask { id, patch } = action else {
            return Effect::None;
        };
        persist_edit(env, id.clone(), patch.clone())
    }
}

fn persist_edit(env: &TaskEnvironment, id: TaskId, patch: TaskPatch) -> Effect<TaskAction> {
    let service = Arc::clone(&env.service);
    let policy = env.retry_policy.clone();

    Effect::future(async move {
        let result = retry_with_predicate(
            &policy,
            || service.update_task(id.clone(), patch.clone()),
            TaskServiceError::is_transient,
        )
        .await;

        match result {
            Ok(()) => {
                tracing::debug!(task_id = %id, "Task update persisted");
                None
            },
            Err(error) => {
                tracing::warn!(task_id = %id, %error, "Failed to persist task update");
                Some(service_failed(ServiceOperation::UpdateTask, &error))
            },
        }
    })
}

/// `DeleteTask` persists the removal
#[derive(Clone, Copy, Debug, Default)]
pub struct PersistDeleteHandler;

impl EffectHandler for PersistDeleteHandler {
    type Action = TaskAction;
    type Environment = TaskEnvironment;

    fn kind(&self) -> &'static str {
        "DeleteTask"
    }

    fn handle(&self, action: &TaskAction, env: &TaskEnvironment) -> Effect<TaskAction> {
        let TaskAction::DeleteTask { id } = action else {
            return Effect::None;
        };

        let service = Arc::clone(&env.service);
        let policy = env.retry_policy.clone();
        let id = id.clone();

        Effect::future(async move {
            match retry_with_predicate(
                &policy,
                || service.delete_task(id.clone()),
                TaskServiceError::is_transient,
            )
            .await
            {
                Ok(()) => {
                    tracing::debug!(task_id = %id, "Task deletion persisted");
                    None
                },
                Err(error) => {
                    tracing::warn!(task_id = %id, %error, "Failed to persist task deletion");
                    Some(service_failed(ServiceOperation::DeleteTask, &error))
                },
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{delete_task, edit_task, load_next_page, reload_tasks};
    use crate::service::{InMemoryTaskService, ServiceCall};
    use crate::types::Task;
    use std::time::Duration;
    use tasklist_testing::{assertions, coordinate_and_collect, init_test_tracing};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn setup(service: &Arc<InMemoryTaskService>) -> EffectCoordinator<TaskAction, TaskEnvironment> {
        init_test_tracing();
        let env = TaskEnvironment::new(Arc::clone(service) as Arc<dyn TaskService>).with_retry_policy(
            RetryPolicy::builder()
                .max_retries(2)
                .initial_delay(Duration::from_millis(1))
                .build(),
        );
        root_effects(env)
    }

    fn service() -> Arc<InMemoryTaskService> {
        Arc::new(
            InMemoryTaskService::with_tasks([
                Task::new("a", "one", false),
                Task::new("b", "two", true),
                Task::new("c", "three", false),
            ])
            .with_page_size(2),
        )
    }

    #[tokio::test]
    async fn load_next_page_emits_the_page() {
        let service = service();
        let coordinator = setup(&service);

        let derived =
            coordinate_and_collect(&coordinator, &load_next_page(Some("2".to_string())), TIMEOUT).await;

        assert_eq!(
            derived,
            vec![tasks_received(vec![Task::new("c", "three", false)], None)]
        );
        assert_eq!(
            service.calls(),
            vec![ServiceCall::ListTasks(Some("2".to_string()))]
        );
    }

    #[tokio::test]
    async fn reload_fetches_the_first_page() {
        let service = service();
        let coordinator = setup(&service);

        let derived = coordinate_and_collect(&coordinator, &reload_tasks(), TIMEOUT).await;

        assert_eq!(
            derived,
            vec![tasks_received(
                vec![Task::new("a", "one", false), Task::new("b", "two", true)],
                Some("2".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn persistence_success_emits_nothing() {
        let service = service();
        let coordinator = setup(&service);

        let edited =
            coordinate_and_collect(&coordinator, &edit_task("a", TaskPatch::complete(true)), TIMEOUT)
                .await;
        let deleted = coordinate_and_collect(&coordinator, &delete_task("b"), TIMEOUT).await;

        assert!(edited.is_empty());
        assert!(deleted.is_empty());
        assert_eq!(
            service.tasks(),
            vec![Task::new("a", "one", true), Task::new("c", "three", false)]
        );
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let service = service();
        service.fail_next(
            ServiceOperation::ListTasks,
            TaskServiceError::Unavailable("blip".to_string()),
        );
        let coordinator = setup(&service);

        let derived = coordinate_and_collect(&coordinator, &reload_tasks(), TIMEOUT).await;

        assert!(matches!(derived.as_slice(), [TaskAction::TasksReceived { .. }]));
        assert_eq!(service.calls().len(), 2);
    }

    #[tokio::test]
    async fn permanent_failure_emits_service_failed() {
        let service = service();
        let coordinator = setup(&service);

        let derived = coordinate_and_collect(&coordinator, &delete_task("zzz"), TIMEOUT).await;

        assert_eq!(
            derived,
            vec![TaskAction::TaskServiceFailed {
                operation: ServiceOperation::DeleteTask,
                message: "Task not found: zzz".to_string(),
            }]
        );
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn unknown_event_is_silent() {
        let service = service();
        let coordinator = setup(&service);

        let derived = coordinate_and_collect(&coordinator, &TaskAction::Unknown, TIMEOUT).await;

        assert!(derived.is_empty());
        assert!(service.calls().is_empty());
    }

    #[test]
    fn handlers_ignore_other_kinds() {
        let env = TaskEnvironment::new(service());

        assertions::assert_no_effects(&LoadNextPageHandler.handle(&reload_tasks(), &env));
        assertions::assert_no_effects(&PersistDeleteHandler.handle(&reload_tasks(), &env));
        assertions::assert_futures_count(&ReloadTasksHandler.handle(&reload_tasks(), &env), 1);
    }

    #[test]
    fn every_effectful_kind_is_handled() {
        let coordinator = root_effects(TaskEnvironment::new(service()));
        assert_eq!(
            coordinator.handled_kinds(),
            vec!["DeleteTask", "EditTask", "LoadNextPage", "ReloadTasks"]
        );
    }
}
