//! Consumer-facing handle on a collection load.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::fetch::AbortController;

/// What a consumer renders: exactly one state at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    /// Retries ran out and nothing was cached; carries the user-facing message
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }
}

/// Owns one in-flight load. Dropping the handle cancels it; a cancelled load
/// publishes nothing and leaves the cache as it was.
#[derive(Debug)]
pub struct LoadHandle<T> {
    state: watch::Receiver<LoadState<T>>,
    controller: AbortController,
    task: JoinHandle<()>,
}

impl<T: Clone> LoadHandle<T> {
    pub(crate) fn new(
        state: watch::Receiver<LoadState<T>>,
        controller: AbortController,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            state,
            controller,
            task,
        }
    }

    /// Current state.
    pub fn state(&self) -> LoadState<T> {
        self.state.borrow().clone()
    }

    /// Receiver for observing state changes.
    pub fn subscribe(&self) -> watch::Receiver<LoadState<T>> {
        self.state.clone()
    }

    /// Waits until the load leaves `Loading`. If it was cancelled, the
    /// state stays `Loading`.
    pub async fn settled(&mut self) -> LoadState<T> {
        let settled = self
            .state
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());
        settled.unwrap_or_else(|_| self.state())
    }

    /// Cancels the load without dropping the handle, e.g. when the
    /// parameters change and a new load replaces this one.
    pub fn abort(&self) {
        self.controller.abort();
    }

    /// Whether the background load has finished, either way.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for LoadHandle<T> {
    fn drop(&mut self) {
        self.controller.abort();
    }
}
