//! Poll gate - the injected "should polling pause?" predicate
//!
//! The host environment decides when polling is pointless or harmful: the
//! browser tab is hidden, or a text-input-like control has focus anywhere in
//! the document (refreshing mid-keystroke would fight the editor). The core
//! only sees this predicate, so the policy is testable without a real DOM.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Predicate consulted before every timed refresh
pub trait PollGate: Send + Sync {
    /// `true` pauses the polling timer (interval effectively zero/paused)
    fn should_pause(&self) -> bool;
}

/// Gate that never pauses - the default for headless hosts and tests
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysActive;

impl PollGate for AlwaysActive {
    fn should_pause(&self) -> bool {
        false
    }
}

/// A settable gate backed by an atomic flag
///
/// Hosts flip it from their visibility/focus listeners; tests flip it
/// directly.
#[derive(Debug, Default)]
pub struct FlagGate {
    paused: AtomicBool,
}

impl FlagGate {
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }
}

impl PollGate for FlagGate {
    fn should_pause(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}
