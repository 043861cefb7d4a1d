//! Task list demo binary
//!
//! Loads a paginated task list from an in-memory service with latency and a
//! flaky first call, then edits and deletes tasks through the store.

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tasks::config::TasksConfig;
use tasks::service::ServiceOperation;
use tasks::store::configure_store_from_config;
use tasks::{
    InMemoryTaskService, Task, TaskAction, TaskPatch, TaskServiceError, delete_task,
    edit_new_task_text, edit_task, get_next_page_token, has_more_pages, load_next_page,
    make_get_tasks, reload_tasks,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);
const DEMO_PAGE_SIZE: usize = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasks=debug,tasklist_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Task List Example ===\n");

    // Small pages so the demo paginates, unless TASKS_PAGE_SIZE says otherwise
    let config = TasksConfig::from_env_or(TasksConfig {
        page_size: DEMO_PAGE_SIZE,
        ..TasksConfig::default()
    })
    .context("invalid TASKS_* configuration")?;

    let service = InMemoryTaskService::with_tasks([
        Task::new("1", "Write the release notes", false),
        Task::new("2", "Review open pull requests", true),
        Task::new("3", "Book the team offsite", false),
        Task::new("4", "Renew the TLS certificates", false),
        Task::new("5", "Archive last quarter's reports", true),
    ])
    .with_latency(Duration::from_millis(20));
    service.fail_next(
        ServiceOperation::ListTasks,
        TaskServiceError::Unavailable("connection reset".to_string()),
    );

    let store = configure_store_from_config(service, &config);

    let get_tasks = make_get_tasks();
    let _subscription = store.subscribe(|state| {
        tracing::trace!(tasks = state.tasks.len(), status = ?state.tasks.status, "State changed");
    });

    let mut failures = store.subscribe_actions();
    tokio::spawn(async move {
        while let Ok(action) = failures.recv().await {
            if let TaskAction::TaskServiceFailed { operation, message } = action {
                println!("  ! {operation} failed: {message}");
            }
        }
    });

    println!(">>> Dispatching: ReloadTasks");
    store.dispatch(reload_tasks());
    println!("Status right after dispatch: {:?}", store.get_state().tasks.status);
    store.settle(SETTLE_TIMEOUT).await?;

    while has_more_pages(&store.get_state()) {
        let token = get_next_page_token(&store.get_state()).map(str::to_string);
        println!(">>> Dispatching: LoadNextPage({token:?})");
        store.dispatch(load_next_page(token));
        store.settle(SETTLE_TIMEOUT).await?;
    }
    print_tasks(&get_tasks.select(&store.get_state()));

    println!("\n>>> Dispatching: EditTask(1, isComplete = true)");
    store.dispatch(edit_task("1", TaskPatch::complete(true)));

    println!(">>> Dispatching: DeleteTask(5)");
    store.dispatch(delete_task("5"));

    println!(">>> Dispatching: DeleteTask(404)");
    store.dispatch(delete_task("404"));

    println!(">>> Dispatching: EditNewTaskText");
    store.dispatch(edit_new_task_text("Plan the next sprint"));

    store.settle(SETTLE_TIMEOUT).await?;
    print_tasks(&get_tasks.select(&store.get_state()));

    let snapshot = serde_json::to_string_pretty(&*store.get_state())?;
    println!("\nFinal state:\n{snapshot}");

    Ok(())
}

fn print_tasks(tasks: &Arc<[Task]>) {
    println!("\nTasks ({}):", tasks.len());
    for task in tasks.iter() {
        let mark = if task.is_complete { "x" } else { " " };
        println!("  [{mark}] {} {}", task.id, task.text);
    }
}
