//! Effect coordination: from incoming actions to asynchronous work.
//!
//! The [`EffectCoordinator`] owns a set of [`EffectHandler`]s, each mapped to
//! exactly one action kind, plus the environment they run against. For every
//! incoming action it looks up the handlers for that kind, asks them for
//! effect descriptions and executes those effects on the Tokio runtime.
//!
//! # Guarantees
//!
//! - Coordination never blocks: every `Effect::Future` is spawned, so derived
//!   actions arrive on a later scheduler turn, never inside the call that
//!   triggered them.
//! - Actions without a registered handler produce no work at all.
//! - Each future runs in its own task. A failing or panicking effect cannot
//!   cancel or corrupt any other in-flight effect.
//! - Derived actions are delivered in the order their effects complete.

use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tasklist_core::action::ActionKind;
use tasklist_core::effect::Effect;
use tasklist_core::handler::EffectHandler;
use tokio::sync::mpsc;

/// Boxed handler for a given action and environment type
pub type BoxedHandler<A, E> = Box<dyn EffectHandler<Action = A, Environment = E>>;

/// Callback used to feed derived actions back into a dispatcher
pub type DispatchFn<A> = Arc<dyn Fn(A) + Send + Sync>;

/// Destination for actions produced by effects
///
/// - `Channel`: pushed onto a derived-event channel (see [`EffectCoordinator::run`])
/// - `Dispatch`: handed to a callback, e.g. the `Store`'s feedback queue
pub enum Feedback<A> {
    /// Send derived actions into a channel
    Channel(mpsc::UnboundedSender<A>),

    /// Call a dispatcher with each derived action
    Dispatch(DispatchFn<A>),
}

impl<A> Feedback<A> {
    /// Deliver one derived action
    pub fn deliver(&self, action: A) {
        match self {
            Self::Channel(tx) => {
                if tx.send(action).is_err() {
                    tracing::debug!("Derived-event receiver dropped, discarding action");
                }
            },
            Self::Dispatch(dispatch) => dispatch(action),
        }
    }
}

impl<A> Clone for Feedback<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Channel(tx) => Self::Channel(tx.clone()),
            Self::Dispatch(dispatch) => Self::Dispatch(Arc::clone(dispatch)),
        }
    }
}

/// RAII guard over one unit of in-flight work, see [`EffectCoordinator::track`]
///
/// Dropped on completion and on panic alike.
#[must_use = "the work is untracked as soon as the guard is dropped"]
pub struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for InFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight").finish_non_exhaustive()
    }
}

/// Maps action kinds to effect handlers and executes their effects
///
/// # Example
///
/// ```ignore
/// let coordinator = EffectCoordinator::new(environment)
///     .with_handler(LoadNextPage)
///     .with_handler(PersistDelete);
///
/// let derived = Arc::new(coordinator).run(events_rx);
/// ```
pub struct EffectCoordinator<A, E> {
    handlers: HashMap<&'static str, Vec<BoxedHandler<A, E>>>,
    environment: E,
    pending: Arc<AtomicUsize>,
}

impl<A, E> EffectCoordinator<A, E>
where
    A: ActionKind + Send + 'static,
    E: Send + Sync + 'static,
{
    /// Create a coordinator with no handlers
    #[must_use]
    pub fn new(environment: E) -> Self {
        Self {
            handlers: HashMap::new(),
            environment,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Register a handler under the kind it reports
    #[must_use]
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: EffectHandler<Action = A, Environment = E> + 'static,
    {
        self.handlers
            .entry(handler.kind())
            .or_default()
            .push(Box::new(handler));
        self
    }

    /// The environment effects run against
    #[must_use]
    pub const fn environment(&self) -> &E {
        &self.environment
    }

    /// Kinds that have at least one handler
    #[must_use]
    pub fn handled_kinds(&self) -> Vec<&'static str> {
        let mut kinds: Vec<_> = self.handlers.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of spawned effects, plus tracked work, not finished yet
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Count extra work as pending until the returned guard is dropped
    ///
    /// A dispatcher that queues derived actions holds one of these per
    /// queued action, so [`pending`](Self::pending) never reads zero between
    /// an effect finishing and its action being applied.
    pub fn track(&self) -> InFlight {
        self.pending.fetch_add(1, Ordering::SeqCst);
        InFlight(Arc::clone(&self.pending))
    }

    /// Coordinate one action, delivering derived actions to `feedback`
    ///
    /// Returns the number of effect tasks spawned. Returns immediately.
    pub fn coordinate(&self, action: &A, feedback: &Feedback<A>) -> usize {
        let kind = action.kind();
        let Some(handlers) = self.handlers.get(kind) else {
            tracing::trace!(kind, "No effect handler registered");
            return 0;
        };

        let effects: SmallVec<[Effect<A>; 4]> = handlers
            .iter()
            .map(|handler| handler.handle(action, &self.environment))
            .collect();

        let spawned = effects
            .into_iter()
            .map(|effect| self.execute(effect, feedback))
            .sum();

        tracing::debug!(kind, spawned, "Coordinated action");
        spawned
    }

    /// Consume a channel of events and return the channel of derived events
    ///
    /// Returns immediately; events are processed on a spawned task. The
    /// returned channel closes once `events` is closed and every effect it
    /// triggered has completed. Must be called from within a Tokio runtime.
    #[must_use]
    pub fn run(self: &Arc<Self>, mut events: mpsc::UnboundedReceiver<A>) -> mpsc::UnboundedReceiver<A> {
        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator = Arc::clone(self);

        tokio::spawn(async move {
            let feedback = Feedback::Channel(tx);
            while let Some(action) = events.recv().await {
                coordinator.coordinate(&action, &feedback);
            }
            tracing::trace!("Event stream closed, coordinator loop finished");
        });

        rx
    }

    /// Execute an effect description
    ///
    /// # Effect Types
    ///
    /// - `None`: No-op
    /// - `Future`: Spawned on its own task, resulting action (if any) delivered
    /// - `Parallel`: Each child executed independently
    fn execute(&self, effect: Effect<A>, feedback: &Feedback<A>) -> usize {
        match effect {
            Effect::None => 0,
            Effect::Parallel(effects) => effects
                .into_iter()
                .map(|effect| self.execute(effect, feedback))
                .sum(),
            Effect::Future(fut) => {
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    tracing::error!("No Tokio runtime available, dropping effect");
                    metrics::counter!("coordinator.effects.dropped").increment(1);
                    return 0;
                };

                let guard = self.track();
                let feedback = feedback.clone();
                metrics::counter!("coordinator.effects.spawned").increment(1);

                runtime.spawn(async move {
                    let _guard = guard;
                    if let Some(action) = fut.await {
                        tracing::trace!(kind = action.kind(), "Effect produced an action");
                        feedback.deliver(action);
                    } else {
                        tracing::trace!("Effect completed with no action");
                    }
                });
                1
            },
        }
    }
}

/// Collects derived actions delivered through a [`Feedback::Dispatch`]
///
/// Handy for observing a coordinator without a channel.
pub struct CollectedActions<A> {
    actions: Arc<Mutex<Vec<A>>>,
}

impl<A> Clone for CollectedActions<A> {
    fn clone(&self) -> Self {
        Self {
            actions: Arc::clone(&self.actions),
        }
    }
}

impl<A: Send + 'static> Default for CollectedActions<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> CollectedActions<A>
where
    A: Send + 'static,
{
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A feedback destination appending to this collector
    #[must_use]
    pub fn feedback(&self) -> Feedback<A> {
        let actions = Arc::clone(&self.actions);
        Feedback::Dispatch(Arc::new(move |action| actions.lock().push(action)))
    }

    /// Take every action collected so far
    #[must_use]
    pub fn take(&self) -> Vec<A> {
        std::mem::take(&mut *self.actions.lock())
    }
}
