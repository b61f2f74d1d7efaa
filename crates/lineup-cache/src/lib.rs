//! # lineup-cache
//!
//! The client-side synchronization cache: the single live copy of each
//! retreat's roster, plus the adaptive polling scheduler that keeps it fresh
//! when the push channel is degraded.
//!
//! ## Design
//!
//! - **Store**: one snapshot per retreat, mutated only through the store's
//!   primitives so every subscribed view observes updates consistently.
//! - **Versioning**: local applies bump a per-retreat version counter;
//!   refresh responses that started before the latest apply are dropped, so
//!   a stale poll can never overwrite a newer push/local value.
//! - **Polling**: paused by an injected predicate (hidden tab, focused text
//!   input), deduplicated within a short window, retried with fixed backoff,
//!   stale-while-error on exhaustion.

pub mod refresh;
pub mod store;

// Re-export store types
pub use store::{Revalidate, RosterStore, SharedRosterStore};

// Re-export refresh types
pub use refresh::{AlwaysActive, FlagGate, PollGate, RefreshConfig, RefreshError, RefreshScheduler};
