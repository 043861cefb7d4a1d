//! Store construction.
//!
//! Each call to [`configure_store`] builds an independent store; nothing is
//! shared between instances.

use crate::actions::TaskAction;
use crate::config::TasksConfig;
use crate::effects::{TaskEnvironment, root_effects};
use crate::reducer::{RootReducer, root_reducer};
use crate::service::InMemoryTaskService;
use crate::types::RootState;
use std::sync::Arc;
use tasklist_runtime::{Store, StoreConfig};

/// The task-list store
pub type TaskStore = Store<RootState, TaskAction, TaskEnvironment, RootReducer>;

/// Builds a store around `env`, starting from `initial_state` or the
/// initial [`RootState`]
#[must_use]
pub fn configure_store(initial_state: Option<RootState>, env: TaskEnvironment) -> TaskStore {
    configure_store_with(initial_state, env, StoreConfig::default())
}

/// Like [`configure_store`], with explicit runtime configuration
#[must_use]
pub fn configure_store_with(
    initial_state: Option<RootState>,
    env: TaskEnvironment,
    config: StoreConfig,
) -> TaskStore {
    tracing::debug!(
        preloaded = initial_state.is_some(),
        broadcast_capacity = config.broadcast_capacity,
        "Configuring task store"
    );

    Store::with_config(
        initial_state.unwrap_or_default(),
        root_reducer(),
        root_effects(env),
        config,
    )
}

/// A store with the initial state, backed by an empty in-memory service
#[must_use]
pub fn configure_default_store() -> TaskStore {
    configure_store(None, TaskEnvironment::new(Arc::new(InMemoryTaskService::new())))
}

/// Builds a store from [`TasksConfig`], backed by an in-memory service
/// holding `service`
#[must_use]
pub fn configure_store_from_config(service: InMemoryTaskService, config: &TasksConfig) -> TaskStore {
    let env = TaskEnvironment::new(Arc::new(service.with_page_size(config.page_size)))
        .with_retry_policy(config.retry_policy());
    configure_store_with(None, env, config.store_config())
}
