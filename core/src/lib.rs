//! # Tasklist Core
//!
//! Core traits and types for the tasklist state container.
//!
//! This crate provides the fundamental abstractions the runtime and the task
//! domain are built from.
//!
//! ## Core Concepts
//!
//! - **State**: An immutable value shared behind an `Arc`
//! - **Action**: A tagged description of an intent or a fact
//! - **Reducer**: Pure function `(Arc<State>, &Action) → Arc<State>`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Effect Handler**: Maps exactly one action kind to an effect
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Unidirectional Data Flow
//! - Structural sharing: an unchanged state is the *same* `Arc`
//! - Explicit Effects (no hidden I/O in reducers)
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tasklist_core::reducer::Reducer;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct CounterState {
//!     count: i64,
//! }
//!
//! enum CounterAction {
//!     Increment,
//!     Unrelated,
//! }
//!
//! struct CounterReducer;
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!
//!     fn reduce(&self, state: &Arc<CounterState>, action: &CounterAction) -> Arc<CounterState> {
//!         match action {
//!             CounterAction::Increment => Arc::new(CounterState { count: state.count + 1 }),
//!             CounterAction::Unrelated => Arc::clone(state),
//!         }
//!     }
//! }
//!
//! let state = Arc::new(CounterState::default());
//! let next = CounterReducer.reduce(&state, &CounterAction::Increment);
//! assert_eq!(next.count, 1);
//! assert!(Arc::ptr_eq(&next, &CounterReducer.reduce(&next, &CounterAction::Unrelated)));
//! ```

/// Reducer composition utilities
pub mod composition;

/// Action module - identity of the inputs flowing through the system
///
/// Actions unify commands (requests that may trigger effects) and events
/// (facts reported back by effects). Every action reports a stable kind name,
/// which is how effect handlers are routed.
pub mod action {
    /// Stable, per-variant name of an action.
    ///
    /// Usually derived with `#[derive(Action)]` from `tasklist-macros`, which
    /// returns the variant name.
    pub trait ActionKind {
        /// The kind of this action (the variant name for derived enums)
        fn kind(&self) -> &'static str;
    }
}

/// Reducer module - The core trait for state transitions
///
/// Reducers are pure functions: `(Arc<State>, &Action) → Arc<State>`.
///
/// They never perform I/O and never fail. When an action does not change
/// state the reducer returns the input `Arc` itself, so readers can detect
/// "nothing changed" by pointer comparison.
pub mod reducer {
    use std::sync::Arc;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer transitions
    /// - `Action`: The action type this reducer processes
    ///
    /// # Contract
    ///
    /// - Total over the action vocabulary: unrecognised actions are no-ops
    /// - A no-op returns `Arc::clone(state)`, never a structurally equal copy
    /// - Never mutates the input; a change always yields a new `Arc`
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// Compute the next state for an action
        fn reduce(&self, state: &Arc<Self::State>, action: &Self::Action) -> Arc<Self::State>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution); the runtime decides when and where
/// they run.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what
    /// should happen, returned by effect handlers and executed by the
    /// runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently, each isolated from the others
        Parallel(Vec<Effect<Action>>),

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the
        /// event stream
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Wrap an async computation into an effect
        #[must_use]
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }

        /// Combine effects to run in parallel
        ///
        /// `None` entries are dropped; a single remaining effect is returned
        /// unwrapped.
        #[must_use]
        pub fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            let mut effects: Vec<_> = effects.into_iter().filter(|e| !e.is_none()).collect();
            match effects.len() {
                0 => Effect::None,
                1 => effects.pop().unwrap_or(Effect::None),
                _ => Effect::Parallel(effects),
            }
        }

        /// Returns true if this effect does nothing
        #[must_use]
        pub fn is_none(&self) -> bool {
            match self {
                Effect::None => true,
                Effect::Parallel(effects) => effects.iter().all(Effect::is_none),
                Effect::Future(_) => false,
            }
        }
    }
}

/// Effect handler module - routing from one action kind to one effect
pub mod handler {
    use super::effect::Effect;

    /// Translates actions of exactly one kind into an effect
    ///
    /// Handlers are registered with the runtime's effect coordinator, which
    /// routes each incoming action by [`ActionKind::kind`](crate::action::ActionKind::kind).
    /// An action whose kind has no handler never reaches any handler.
    ///
    /// # Example
    ///
    /// ```ignore
    /// struct PersistDelete;
    ///
    /// impl EffectHandler for PersistDelete {
    ///     type Action = TaskAction;
    ///     type Environment = TaskEnvironment;
    ///
    ///     fn kind(&self) -> &'static str {
    ///         "DeleteTask"
    ///     }
    ///
    ///     fn handle(&self, action: &TaskAction, env: &TaskEnvironment) -> Effect<TaskAction> {
    ///         // ...
    ///     }
    /// }
    /// ```
    pub trait EffectHandler: Send + Sync {
        /// The action type this handler consumes and produces
        type Action;

        /// The injected dependencies the handler needs
        type Environment;

        /// The single action kind this handler is mapped to
        fn kind(&self) -> &'static str;

        /// Describe the effect for a matching action
        ///
        /// Must return [`Effect::None`] for actions of any other kind.
        fn handle(&self, action: &Self::Action, env: &Self::Environment) -> Effect<Self::Action>;
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;

    #[test]
    fn merge_drops_noops() {
        let merged = Effect::<()>::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::None));
    }

    #[test]
    fn merge_unwraps_single_effect() {
        let merged = Effect::merge(vec![Effect::None, Effect::future(async { Some(1) })]);
        assert!(matches!(merged, Effect::Future(_)));
    }

    #[test]
    fn merge_keeps_parallel_effects() {
        let merged = Effect::merge(vec![
            Effect::future(async { Some(1) }),
            Effect::future(async { Some(2) }),
        ]);
        assert!(matches!(merged, Effect::Parallel(ref effects) if effects.len() == 2));
        assert!(!merged.is_none());
    }

    #[test]
    fn nested_noops_are_none() {
        let effect = Effect::<()>::Parallel(vec![Effect::None, Effect::Parallel(vec![])]);
        assert!(effect.is_none());
        assert_eq!(format!("{effect:?}"), "Effect::Parallel([Effect::None, Effect::Parallel([])])");
    }
}
