//! # Tasklist Testing
//!
//! Testing utilities and helpers for the tasklist state container.
//!
//! This crate provides:
//! - A Given-When-Then builder for reducers
//! - Assertion helpers for effect descriptions
//! - Helpers that drive an effect coordinator to completion
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```ignore
//! use tasklist_testing::{coordinate_and_collect, init_test_tracing};
//!
//! #[tokio::test]
//! async fn test_reload_fetches_first_page() {
//!     init_test_tracing();
//!     let coordinator = EffectCoordinator::new(env).with_handler(ReloadHandler);
//!
//!     let derived = coordinate_and_collect(&coordinator, &TaskAction::ReloadTasks, TIMEOUT).await;
//!     assert_eq!(derived.len(), 1);
//! }
//! ```

use std::time::Duration;
use tasklist_core::action::ActionKind;
use tasklist_runtime::{CollectedActions, EffectCoordinator};


pub use reducer_test::{ReducerTest, assertions};

/// Install a tracing subscriber writing through the test harness
///
/// Honours `RUST_LOG`. Safe to call from every test; only the first call
/// installs anything.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Coordinate one action and wait for every effect it spawned
///
/// Returns the derived actions in completion order. Effects still running
/// after `timeout` are abandoned and whatever arrived so far is returned.
pub async fn coordinate_and_collect<A, E>(
    coordinator: &EffectCoordinator<A, E>,
    action: &A,
    timeout: Duration,
) -> Vec<A>
where
    A: ActionKind + Send + 'static,
    E: Send + Sync + 'static,
{
    let collected = CollectedActions::new();
    coordinator.coordinate(action, &collected.feedback());

    let _ = tokio::time::timeout(timeout, async {
        while coordinator.pending() > 0 {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;

    collected.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklist_core::effect::Effect;
    use tasklist_core::handler::EffectHandler;
    use tasklist_macros::Action;

    #[derive(Action, Clone, Debug, PartialEq)]
    enum PingAction {
        #[command]
        Ping,
        #[event]
        Pong,
    }

    struct Responder;

    impl EffectHandler for Responder {
        type Action = PingAction;
        type Environment = ();

        fn kind(&self) -> &'static str {
            "Ping"
        }

        fn handle(&self, _action: &PingAction, _env: &()) -> Effect<PingAction> {
            Effect::future(async { Some(PingAction::Pong) })
        }
    }

    #[tokio::test]
    async fn test_coordinate_and_collect() {
        init_test_tracing();
        let coordinator = EffectCoordinator::new(()).with_handler(Responder);

        let derived =
            coordinate_and_collect(&coordinator, &PingAction::Ping, Duration::from_secs(1)).await;
        assert_eq!(derived, vec![PingAction::Pong]);

        let derived =
            coordinate_and_collect(&coordinator, &PingAction::Pong, Duration::from_secs(1)).await;
        assert!(derived.is_empty());
    }
}
