//! Debounced autosave controller
//!
//! Wraps any save future with idle-window collapsing: rapid repeated calls
//! keep replacing the scheduled run, and only the last one fires after the
//! window elapses. The blur-commit path runs the save directly and calls
//! [`Debouncer::cancel`], which is the flush-equivalent - there is never a
//! second, deferred save racing the synchronous one.
//!
//! Dropping the controller cancels the pending run, so a torn-down editor
//! can never save into a context that no longer exists.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Collapses rapid calls into one deferred run after an idle window
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Default idle window for lineup autosave
    pub const AUTOSAVE_DELAY: Duration = Duration::from_secs(2);

    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Schedule `action` after the idle window, replacing any pending run
    pub fn call<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    /// Cancel the pending run, if any.
    ///
    /// Called on teardown, and by the blur-commit path right before running
    /// the save directly.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a run is scheduled and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
