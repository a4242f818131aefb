//! Timers, local tasks and disposal tokens that work the same in the browser
//! and in native builds/tests.
//!
//! The browser build runs on the wasm event loop (`gloo_timers`,
//! `wasm_bindgen_futures`). Native builds use tokio and must run inside a
//! `tokio::task::LocalSet` because list state is `Rc`-based.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleep for `duration` on whichever event loop is driving us
pub async fn sleep(duration: Duration) {
    #[cfg(target_arch = "wasm32")]
    {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        gloo_timers::future::TimeoutFuture::new(millis).await;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::time::sleep(duration).await;
    }
}

/// Spawn a `!Send` task on the current thread
///
/// # Panics
/// Native builds panic when called outside a `tokio::task::LocalSet`
/// (e.g. straight from `#[tokio::main]`). Wrap the caller in
/// `LocalSet::run_until`.
pub fn spawn_local<F>(task: F)
where
    F: Future<Output = ()> + 'static,
{
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(task);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        // Detached: completion is observed through shared state, not the handle
        drop(tokio::task::spawn_local(task));
    }
}

/// Cancellation handle owned by a screen (or any other owner with a teardown
/// path). Everything scheduled under the token, or under one of its children,
/// must check it before touching state.
#[derive(Debug, Clone, Default)]
pub struct DisposalToken {
    cancel: CancellationToken,
}

impl DisposalToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that is disposed together with this one but can also be
    /// disposed on its own (one pending timer, one request...)
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }

    pub fn dispose(&self) {
        self.cancel.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the token is disposed
    pub async fn disposed(&self) {
        self.cancel.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_disposed_with_parent() {
        let parent = DisposalToken::new();
        let child = parent.child();
        assert!(!child.is_disposed());

        parent.dispose();
        assert!(child.is_disposed());
    }

    #[test]
    fn test_child_disposal_does_not_reach_parent() {
        let parent = DisposalToken::new();
        let child = parent.child();
        child.dispose();

        assert!(child.is_disposed());
        assert!(!parent.is_disposed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_advances_clock() {
        let start = tokio::time::Instant::now();
        sleep(Duration::from_millis(300)).await;
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
