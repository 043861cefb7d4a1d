//! Reducer composition utilities
//!
//! This module provides utilities for composing reducers:
//! - **`combine_reducers`**: Run multiple reducers on the same state/action
//! - **`scope_reducer`**: Focus a reducer on one `Arc` slice of a larger state
//!
//! Both preserve identity: if no inner reducer produces a new value, the
//! input `Arc` is returned untouched.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use tasklist_core::composition::{combine_reducers, scope_reducer};
//! use tasklist_core::reducer::Reducer;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Counter {
//!     count: i32,
//! }
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct AppState {
//!     left: Arc<Counter>,
//!     right: Arc<Counter>,
//! }
//!
//! enum Action {
//!     BumpLeft,
//!     BumpRight,
//! }
//!
//! struct Left;
//! struct Right;
//!
//! impl Reducer for Left {
//!     type State = Counter;
//!     type Action = Action;
//!
//!     fn reduce(&self, state: &Arc<Counter>, action: &Action) -> Arc<Counter> {
//!         match action {
//!             Action::BumpLeft => Arc::new(Counter { count: state.count + 1 }),
//!             Action::BumpRight => Arc::clone(state),
//!         }
//!     }
//! }
//!
//! impl Reducer for Right {
//!     type State = Counter;
//!     type Action = Action;
//!
//!     fn reduce(&self, state: &Arc<Counter>, action: &Action) -> Arc<Counter> {
//!         match action {
//!             Action::BumpRight => Arc::new(Counter { count: state.count + 1 }),
//!             Action::BumpLeft => Arc::clone(state),
//!         }
//!     }
//! }
//!
//! let app = combine_reducers(vec![
//!     Box::new(scope_reducer(
//!         Left,
//!         |s: &AppState| &s.left,
//!         |s: &AppState, left| AppState { left, ..s.clone() },
//!     )),
//!     Box::new(scope_reducer(
//!         Right,
//!         |s: &AppState| &s.right,
//!         |s: &AppState, right| AppState { right, ..s.clone() },
//!     )),
//! ]);
//!
//! let state = Arc::new(AppState::default());
//! let next = app.reduce(&state, &Action::BumpLeft);
//! assert_eq!(next.left.count, 1);
//! assert!(Arc::ptr_eq(&next.right, &state.right));
//! ```

use crate::reducer::Reducer;
use std::sync::Arc;

/// Boxed reducer over a shared state and action type
pub type BoxedReducer<S, A> = Box<dyn Reducer<State = S, Action = A> + Send + Sync>;

/// Combines multiple reducers that operate on the same state and action types.
///
/// Each reducer is run in sequence, each one seeing the output of the
/// previous one.
#[must_use]
pub fn combine_reducers<S, A>(reducers: Vec<BoxedReducer<S, A>>) -> CombinedReducer<S, A>
where
    S: 'static,
    A: 'static,
{
    CombinedReducer { reducers }
}

/// A combined reducer that runs multiple reducers in sequence.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A>
where
    S: 'static,
    A: 'static,
{
    reducers: Vec<BoxedReducer<S, A>>,
}

impl<S, A> Reducer for CombinedReducer<S, A>
where
    S: 'static,
    A: 'static,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &Arc<Self::State>, action: &Self::Action) -> Arc<Self::State> {
        self.reducers
            .iter()
            .fold(Arc::clone(state), |current, reducer| reducer.reduce(&current, action))
    }
}

/// Scopes a reducer to operate on one slice of a larger state.
///
/// `get_state` borrows the child `Arc` out of the parent; `set_state` builds a
/// new parent around a changed child. `set_state` is only called when the
/// child reducer returns a different `Arc`.
pub fn scope_reducer<S, SubS, A, R>(
    reducer: R,
    get_state: fn(&S) -> &Arc<SubS>,
    set_state: fn(&S, Arc<SubS>) -> S,
) -> ScopedReducer<S, SubS, A, R>
where
    R: Reducer<State = SubS, Action = A>,
{
    ScopedReducer {
        reducer,
        get_state,
        set_state,
        _phantom: std::marker::PhantomData,
    }
}

/// A scoped reducer that operates on a subset of state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, SubS, A, R>
where
    R: Reducer<State = SubS, Action = A>,
{
    reducer: R,
    get_state: fn(&S) -> &Arc<SubS>,
    set_state: fn(&S, Arc<SubS>) -> S,
    _phantom: std::marker::PhantomData<fn(&A)>,
}

impl<S, SubS, A, R> Reducer for ScopedReducer<S, SubS, A, R>
where
    R: Reducer<State = SubS, Action = A>,
{
    type State = S;
    type Action = A;

    fn reduce(&self, state: &Arc<Self::State>, action: &Self::Action) -> Arc<Self::State> {
        let current = (self.get_state)(state);
        let next = self.reducer.reduce(current, action);

        if Arc::ptr_eq(current, &next) {
            return Arc::clone(state);
        }

        Arc::new((self.set_state)(state, next))
    }
}
