//! Integration tests for the task store
//!
//! These tests drive the full flow: dispatch, reducer, effect handlers,
//! the in-memory task service and the feedback of derived events.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tasklist_runtime::retry::RetryPolicy;
use tasklist_testing::init_test_tracing;
use tasks::service::{ServiceCall, ServiceOperation};
use tasks::{
    InMemoryTaskService, LoadStatus, RootState, Task, TaskAction, TaskEnvironment, TaskPatch,
    TaskServiceError, TaskStore, TasksState, configure_default_store, configure_store, delete_task,
    edit_new_task_text, edit_task, get_task_by_id, load_next_page, make_get_tasks, reload_tasks,
};
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(2);

fn seeded_service() -> Arc<InMemoryTaskService> {
    Arc::new(
        InMemoryTaskService::with_tasks([
            Task::new("a", "foo", false),
            Task::new("b", "bar", true),
            Task::new("c", "baz", false),
        ])
        .with_page_size(2),
    )
}

fn env(service: &Arc<InMemoryTaskService>) -> TaskEnvironment {
    TaskEnvironment::new(Arc::clone(service) as Arc<dyn tasks::TaskService>).with_retry_policy(
        RetryPolicy::builder()
            .max_retries(1)
            .initial_delay(Duration::from_millis(1))
            .build(),
    )
}

fn store_for(service: &Arc<InMemoryTaskService>) -> TaskStore {
    init_test_tracing();
    configure_store(None, env(service))
}

#[test]
fn test_configure_store_without_state() {
    let state = configure_default_store().get_state();

    assert_eq!(state.tasks.status, LoadStatus::Unloaded);
    assert!(state.tasks.is_empty());
    assert_eq!(state.tasks.next_page_token, None);
    assert_eq!(state.new_task.text, "");
}

#[test]
fn test_configure_store_with_initial_state() {
    let initial = RootState::with_tasks(TasksState::loaded([Task::new("a", "foo", false)], None));
    let store = configure_store(Some(initial.clone()), env(&seeded_service()));

    assert_eq!(*store.get_state(), initial);
}

#[tokio::test]
async fn test_reload_then_paginate() {
    let service = seeded_service();
    let store = store_for(&service);

    store.dispatch(reload_tasks());
    // The reducer ran, the fetch has not been applied yet
    assert_eq!(store.get_state().tasks.status, LoadStatus::Loading);
    assert!(store.get_state().tasks.is_empty());

    store.settle(TIMEOUT).await.unwrap();
    let state = store.get_state();
    assert_eq!(state.tasks.status, LoadStatus::Loaded);
    assert_eq!(state.tasks.len(), 2);
    assert_eq!(state.tasks.next_page_token.as_deref(), Some("2"));

    store.dispatch(load_next_page(state.tasks.next_page_token.clone()));
    store.settle(TIMEOUT).await.unwrap();

    let get_tasks = make_get_tasks();
    let tasks = get_tasks.select(&store.get_state());
    let ids: Vec<_> = tasks.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(store.get_state().tasks.next_page_token, None);
}

#[tokio::test]
async fn test_dispatch_and_wait_for_page() {
    let service = seeded_service();
    let store = store_for(&service);

    let received = store
        .dispatch_and_wait_for(
            reload_tasks(),
            |action| matches!(action, TaskAction::TasksReceived { .. }),
            TIMEOUT,
        )
        .await
        .unwrap();

    let TaskAction::TasksReceived { items, .. } = received else {
        panic!("expected TasksReceived, got {received:?}");
    };
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_edit_and_delete_are_local_then_persisted() {
    let service = seeded_service();
    let store = store_for(&service);
    store.dispatch(reload_tasks());
    store.settle(TIMEOUT).await.unwrap();
    let before = store.get_state();

    store.dispatch(edit_task("a", TaskPatch::complete(true)));
    store.dispatch(delete_task("b"));

    // Local state changed synchronously
    let after = store.get_state();
    assert_eq!(get_task_by_id(&after, "a"), Some(&Task::new("a", "foo", true)));
    assert_eq!(get_task_by_id(&after, "b"), None);
    assert!(Arc::ptr_eq(&after.new_task, &before.new_task));

    store.settle(TIMEOUT).await.unwrap();
    assert_eq!(
        service.tasks(),
        vec![Task::new("a", "foo", true), Task::new("c", "baz", false)]
    );
    // Persistence emits nothing on success
    assert_eq!(store.get_state(), after);
}

#[tokio::test]
async fn test_failed_persistence_does_not_block_page_load() {
    let service = seeded_service();
    service.fail_next(
        ServiceOperation::DeleteTask,
        TaskServiceError::Rejected("read only".to_string()),
    );
    let store = store_for(&service);
    let mut derived = store.subscribe_actions();

    store.dispatch(delete_task("a"));
    store.dispatch(reload_tasks());
    store.settle(TIMEOUT).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(action) = derived.try_recv() {
        seen.push(action);
    }

    assert!(seen.iter().any(|action| matches!(
        action,
        TaskAction::TaskServiceFailed {
            operation: ServiceOperation::DeleteTask,
            ..
        }
    )));
    assert!(seen.iter().any(|action| matches!(action, TaskAction::TasksReceived { .. })));
    assert_eq!(store.get_state().tasks.status, LoadStatus::Loaded);
}

#[tokio::test]
async fn test_late_page_after_reload_is_merged() {
    let service = Arc::new(
        InMemoryTaskService::with_tasks([Task::new("a", "foo", false), Task::new("b", "bar", true)])
            .with_page_size(1)
            .with_latency(Duration::from_millis(30)),
    );
    let store = store_for(&service);
    store.dispatch(load_next_page(Some("1".to_string())));
    store.dispatch(reload_tasks());
    store.settle(TIMEOUT).await.unwrap();

    // No stale-result suppression: both pages end up in the collection
    let state = store.get_state();
    assert!(state.tasks.contains("a"));
    assert!(state.tasks.contains("b"));
}

#[tokio::test]
async fn test_listeners_and_unsubscribe() {
    let store = store_for(&seeded_service());
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let subscription = store.subscribe(move |state| {
        assert!(!state.new_task.text.is_empty());
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.dispatch(edit_new_task_text("bar"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    assert!(subscription.unsubscribe());
    store.dispatch(edit_new_task_text(""));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_event_is_a_noop_everywhere() {
    let service = seeded_service();
    let store = store_for(&service);
    let before = store.get_state();

    store.dispatch(TaskAction::Unknown);
    assert_eq!(store.pending_effects(), 0);

    assert!(Arc::ptr_eq(&before, &store.get_state()));
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_coordinator_stream_ignores_unknown_events() {
    let service = seeded_service();
    let coordinator = Arc::new(tasks::root_effects(env(&service)));
    let (tx, rx) = mpsc::unbounded_channel();
    let mut derived = coordinator.run(rx);

    tx.send(TaskAction::Unknown).unwrap();
    drop(tx);

    let next = tokio::time::timeout(TIMEOUT, derived.recv()).await.unwrap();
    assert_eq!(next, None);
    assert!(service.calls().is_empty());
}

#[tokio::test]
async fn test_coordinator_stream_emits_page() {
    let service = seeded_service();
    let coordinator = Arc::new(tasks::root_effects(env(&service)));
    let (tx, rx) = mpsc::unbounded_channel();
    let mut derived = coordinator.run(rx);

    tx.send(load_next_page(None)).unwrap();
    drop(tx);

    let first = tokio::time::timeout(TIMEOUT, derived.recv()).await.unwrap();
    assert!(matches!(
        first,
        Some(TaskAction::TasksReceived { ref items, .. }) if items.len() == 2
    ));
    assert_eq!(tokio::time::timeout(TIMEOUT, derived.recv()).await.unwrap(), None);
    assert_eq!(service.calls(), vec![ServiceCall::ListTasks(None)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_page_is_applied_after_reload_dispatch_returns() {
    let service = seeded_service();
    let store = store_for(&service);
    let status_inside_dispatch = Arc::new(parking_lot::Mutex::new(None));

    let handle = store.clone();
    let observed = Arc::clone(&status_inside_dispatch);
    let subscription = store.subscribe(move |state| {
        let mut observed = observed.lock();
        if observed.is_none() && state.tasks.status == LoadStatus::Loading {
            // The fetch has no latency and finishes while we wait here
            std::thread::sleep(Duration::from_millis(50));
            *observed = Some(handle.get_state().tasks.status);
        }
    });

    store.dispatch(reload_tasks());
    assert_eq!(*status_inside_dispatch.lock(), Some(LoadStatus::Loading));

    store.settle(TIMEOUT).await.unwrap();
    assert_eq!(store.get_state().tasks.status, LoadStatus::Loaded);
    assert!(subscription.unsubscribe());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_listener_last_sees_final_state() {
    let service = Arc::new(
        InMemoryTaskService::with_tasks((0..64).map(|i| Task::new(i.to_string(), "task", false)))
            .with_page_size(1),
    );
    let store = store_for(&service);
    let last_seen: Arc<parking_lot::Mutex<Option<Arc<RootState>>>> = Arc::default();

    let observed = Arc::clone(&last_seen);
    let _subscription = store.subscribe(move |state| {
        *observed.lock() = Some(Arc::clone(state));
    });

    let handles: Vec<_> = (0..64)
        .map(|page| {
            let store = store.clone();
            tokio::spawn(async move { store.dispatch(load_next_page(Some(page.to_string()))) })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }
    store.settle(TIMEOUT).await.unwrap();

    let state = store.get_state();
    assert_eq!(state.tasks.len(), 64);
    let last = last_seen.lock().clone().unwrap();
    assert!(Arc::ptr_eq(&last, &state));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dispatch_and_wait_for_returns_with_page_applied() {
    for _ in 0..50 {
        let store = store_for(&seeded_service());

        store
            .dispatch_and_wait_for(
                reload_tasks(),
                |action| matches!(action, TaskAction::TasksReceived { .. }),
                TIMEOUT,
            )
            .await
            .unwrap();

        let state = store.get_state();
        assert_eq!(state.tasks.status, LoadStatus::Loaded);
        assert_eq!(state.tasks.len(), 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reload_then_paginate_on_worker_threads() {
    let service = seeded_service();
    let store = store_for(&service);

    store.dispatch(reload_tasks());
    store.settle(TIMEOUT).await.unwrap();
    let token = store.get_state().tasks.next_page_token.clone();
    assert_eq!(token.as_deref(), Some("2"));

    store.dispatch(load_next_page(token));
    store.settle(TIMEOUT).await.unwrap();

    let ids: Vec<_> = make_get_tasks()
        .select(&store.get_state())
        .iter()
        .map(|task| task.id.to_string())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}
