//! # Tasklist Runtime
//!
//! Runtime implementation for the tasklist state container.
//!
//! This crate provides the Store that owns state, applies the reducer, and
//! hands every dispatched action to the effect coordinator.
//!
//! ## Core Components
//!
//! - **Store**: Owns the current `Arc<State>`; `get_state` / `dispatch` / `subscribe`
//! - **Effect Coordinator**: Routes actions to effect handlers, spawns their work
//! - **Feedback Loop**: Actions produced by effects are queued and applied by one store-owned task
//!
//! ## Example
//!
//! ```ignore
//! use tasklist_runtime::{EffectCoordinator, Store};
//!
//! let store = Store::new(
//!     initial_state,
//!     my_reducer,
//!     EffectCoordinator::new(environment).with_handler(MyHandler),
//! );
//!
//! // Dispatch an action: the reducer runs before this returns
//! store.dispatch(Action::DoSomething);
//!
//! // Read state
//! let snapshot = store.get_state();
//! ```

use std::time::Duration;

/// Effect coordination (event channel in, derived-event channel out)
pub mod coordinator;

/// Retry logic with exponential backoff
pub mod retry;

pub use coordinator::{CollectedActions, EffectCoordinator, Feedback, InFlight};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    ///
    /// Dispatching itself never fails; these errors come from the waiting
    /// helpers layered on top of it.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Timeout waiting for a derived action
        ///
        /// Returned by `dispatch_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Effects were still running when the settle timeout elapsed
        #[error("Store did not settle: {0} effects still running")]
        SettleTimeout(usize),

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store behavior
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use tasklist_runtime::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_settle_poll_interval(Duration::from_millis(5));
/// assert_eq!(config.broadcast_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity of the derived-action broadcast channel
    pub broadcast_capacity: usize,
    /// How often `settle` re-checks the number of in-flight effects
    pub settle_poll_interval: Duration,
}

impl StoreConfig {
    /// Create a new configuration
    #[must_use]
    pub const fn new(broadcast_capacity: usize, settle_poll_interval: Duration) -> Self {
        Self {
            broadcast_capacity,
            settle_poll_interval,
        }
    }

    /// Set the derived-action broadcast capacity
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }

    /// Set the settle polling interval
    #[must_use]
    pub const fn with_settle_poll_interval(mut self, interval: Duration) -> Self {
        self.settle_poll_interval = interval;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            settle_poll_interval: Duration::from_millis(10),
        }
    }
}

/// Store module - The runtime for reducers
pub mod store {
    use super::{Duration, EffectCoordinator, Feedback, StoreConfig, StoreError};
    use crate::coordinator::InFlight;
    use parking_lot::{Mutex, ReentrantMutex, RwLock};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Weak};
    use tasklist_core::action::ActionKind;
    use tasklist_core::reducer::Reducer;
    use tokio::sync::{broadcast, mpsc};

    /// A state listener registered through [`Store::subscribe`]
    pub type Listener<S> = Arc<dyn Fn(&Arc<S>) + Send + Sync>;

    type Listeners<S> = Mutex<Vec<(u64, Listener<S>)>>;

    /// A derived action waiting to be applied, counted as pending until then
    type Queued<A> = (A, InFlight);

    struct Inner<S, A, E, R> {
        state: RwLock<Arc<S>>,
        /// Held for a whole dispatch, so reductions, listener calls and
        /// effect spawns of one dispatch never interleave with another's.
        /// Reentrant: listeners may dispatch.
        dispatching: ReentrantMutex<()>,
        reducer: R,
        coordinator: Arc<EffectCoordinator<A, E>>,
        listeners: Arc<Listeners<S>>,
        next_listener_id: AtomicU64,
        feedback: Feedback<A>,
        /// Taken by the first dispatch that runs inside a Tokio runtime.
        feedback_rx: Mutex<Option<mpsc::UnboundedReceiver<Queued<A>>>>,
        config: StoreConfig,
        /// Every action produced by effects is broadcast once applied.
        action_broadcast: broadcast::Sender<A>,
    }

    /// The Store - owner of state for one reducer
    ///
    /// The Store manages:
    /// 1. State (an `Arc<S>` swapped on every change)
    /// 2. Reducer (pure transitions, applied one dispatch at a time)
    /// 3. Effect coordination (with feedback loop)
    /// 4. Listeners notified after every dispatch
    ///
    /// Actions produced by effects are queued and applied by a single
    /// store-owned task, in arrival order, each one after the dispatch that
    /// triggered it has returned.
    ///
    /// Cloning a Store yields another handle onto the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type of the coordinator
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R> {
        inner: Arc<Inner<S, A, E, R>>,
    }

    /// Handle returned by [`Store::subscribe`]
    ///
    /// Dropping the handle keeps the listener registered; call
    /// [`Subscription::unsubscribe`] to remove it.
    #[must_use = "a listener can only be removed through its Subscription"]
    pub struct Subscription<S> {
        id: u64,
        listeners: Weak<Listeners<S>>,
    }

    impl<S> Subscription<S> {
        /// Remove the listener
        ///
        /// Returns `false` if it was already removed or the store is gone.
        #[allow(clippy::must_use_candidate)]
        pub fn unsubscribe(self) -> bool {
            let Some(listeners) = self.listeners.upgrade() else {
                return false;
            };
            let mut listeners = listeners.lock();
            let before = listeners.len();
            listeners.retain(|(id, _)| *id != self.id);
            listeners.len() != before
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        S: Send + Sync + 'static,
        A: ActionKind + Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
        R: Reducer<State = S, Action = A> + Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and coordinator
        #[must_use]
        pub fn new(initial_state: S, reducer: R, coordinator: EffectCoordinator<A, E>) -> Self {
            Self::with_config(initial_state, reducer, coordinator, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        ///
        /// Does not need a Tokio runtime; the feedback task is started by the
        /// first dispatch made inside one.
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            coordinator: EffectCoordinator<A, E>,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));
            let coordinator = Arc::new(coordinator);

            let (feedback_tx, feedback_rx) = mpsc::unbounded_channel::<Queued<A>>();
            let tracker = Arc::clone(&coordinator);
            let feedback = Feedback::Dispatch(Arc::new(move |action: A| {
                // Counted before the effect's own guard drops
                let in_flight = tracker.track();
                if feedback_tx.send((action, in_flight)).is_err() {
                    tracing::debug!("Store feedback task gone, discarding action");
                }
            }));

            Self {
                inner: Arc::new(Inner {
                    state: RwLock::new(Arc::new(initial_state)),
                    dispatching: ReentrantMutex::new(()),
                    reducer,
                    coordinator,
                    listeners: Arc::new(Mutex::new(Vec::new())),
                    next_listener_id: AtomicU64::new(0),
                    feedback,
                    feedback_rx: Mutex::new(Some(feedback_rx)),
                    config,
                    action_broadcast,
                }),
            }
        }

        /// Synchronous snapshot of the current state
        #[must_use]
        pub fn get_state(&self) -> Arc<S> {
            Arc::clone(&*self.inner.state.read())
        }

        /// Dispatch an action to the store
        ///
        /// 1. Runs the reducer under the state lock
        /// 2. Hands the action to the effect coordinator
        /// 3. Notifies listeners with the new state
        ///
        /// The whole call is serialised with every other dispatch, so
        /// listeners observe states in reduction order. Returns once the
        /// reducer has been applied; effects run later on the Tokio runtime
        /// and their actions are applied by the store's feedback task.
        #[tracing::instrument(skip(self, action), fields(kind = action.kind()), name = "store_dispatch")]
        pub fn dispatch(&self, action: A) {
            metrics::counter!("store.actions.total").increment(1);

            let _dispatching = self.inner.dispatching.lock();

            let (changed, next) = {
                let mut state = self.inner.state.write();

                let start = std::time::Instant::now();
                let next = self.inner.reducer.reduce(&state, &action);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                let changed = !Arc::ptr_eq(&*state, &next);
                if changed {
                    *state = Arc::clone(&next);
                }
                (changed, next)
            };
            tracing::trace!(changed, "Reducer completed");

            self.start_feedback_task();
            let spawned = self.inner.coordinator.coordinate(&action, &self.inner.feedback);

            self.notify(&next);
            tracing::debug!(changed, spawned, "Action dispatched");
        }

        /// Register a listener called with the new state after every dispatch
        pub fn subscribe<F>(&self, listener: F) -> Subscription<S>
        where
            F: Fn(&Arc<S>) + Send + Sync + 'static,
        {
            let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
            self.inner.listeners.lock().push((id, Arc::new(listener)));
            Subscription {
                id,
                listeners: Arc::downgrade(&self.inner.listeners),
            }
        }

        /// Subscribe to every action produced by effects
        ///
        /// An action is broadcast after the reducer has applied it, so
        /// [`Store::get_state`] already reflects it on receipt. Actions
        /// dispatched directly through [`Store::dispatch`] are not broadcast.
        /// A lagging receiver skips old actions and observes
        /// [`broadcast::error::RecvError::Lagged`].
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.inner.action_broadcast.subscribe()
        }

        /// Dispatch an action and wait for a matching derived action
        ///
        /// Subscribes to the action broadcast before dispatching, so a fast
        /// effect cannot be missed. The matching action has been applied to
        /// state when this returns.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: no matching action arrived in time
        /// - [`StoreError::ChannelClosed`]: the broadcast channel closed
        pub async fn dispatch_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            F: Fn(&A) -> bool,
        {
            let mut rx = self.inner.action_broadcast.subscribe();

            self.dispatch(action);

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged");
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Number of effects in flight, including derived actions not yet applied
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.inner.coordinator.pending()
        }

        /// Wait until no effects are in flight
        ///
        /// Effects triggered by derived actions count too, so once this
        /// returns every cascade has been applied to state.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::SettleTimeout`] if effects are still running
        /// when `timeout` elapses.
        pub async fn settle(&self, timeout: Duration) -> Result<(), StoreError> {
            let start = std::time::Instant::now();

            loop {
                let pending = self.pending_effects();
                if pending == 0 {
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::warn!(pending_effects = pending, "Settle timed out");
                    return Err(StoreError::SettleTimeout(pending));
                }

                tokio::time::sleep(self.inner.config.settle_poll_interval).await;
            }
        }

        fn start_feedback_task(&self) {
            let mut slot = self.inner.feedback_rx.lock();
            if slot.is_none() {
                return;
            }
            let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                return;
            };
            if let Some(queued) = slot.take() {
                runtime.spawn(Self::apply_derived(Arc::downgrade(&self.inner), queued));
                tracing::trace!("Store feedback task started");
            }
        }

        /// Apply derived actions one at a time, in the order they were queued
        async fn apply_derived(
            store: Weak<Inner<S, A, E, R>>,
            mut queued: mpsc::UnboundedReceiver<Queued<A>>,
        ) {
            while let Some((action, in_flight)) = queued.recv().await {
                let Some(inner) = store.upgrade() else {
                    tracing::debug!("Store dropped before effect completed, discarding action");
                    break;
                };
                let store = Self { inner };
                store.dispatch(action.clone());
                // No receivers is fine: observers are optional.
                let _ = store.inner.action_broadcast.send(action);
                // Released only after any effects the action spawned are counted
                drop(in_flight);
            }
            tracing::trace!("Store feedback task finished");
        }

        fn notify(&self, state: &Arc<S>) {
            // Listeners run outside the state lock so they may read, subscribe or dispatch.
            let listeners: Vec<_> = self
                .inner
                .listeners
                .lock()
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();

            for listener in listeners {
                listener(state);
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R> {
        fn clone(&self) -> Self {
            Self {
                inner: Arc::clone(&self.inner),
            }
        }
    }
}

// Re-export for convenience
pub use store::{Store, Subscription};
