//! # lineup-sync
//!
//! The application layer of the synchronization core:
//!
//! - [`SyncOrchestrator`]: the three-phase mutation sequence (optimistic
//!   cache update, network request, confirm-or-rollback), identical over the
//!   HTTP and push transports.
//! - [`FieldEditor`]: the per-field edit buffer and conflict detector, an
//!   explicit state machine independent of any UI framework.
//! - [`Debouncer`]: the autosave controller collapsing rapid edits into one
//!   deferred save.
//! - [`LineupSession`]: the composition a host embeds - store, polling,
//!   push bridge, and transport selection in one handle.

pub mod debounce;
pub mod editor;
pub mod orchestrator;
pub mod session;

pub use debounce::Debouncer;
pub use editor::{CommitOutcome, EditorState, FieldEditor, FieldKind, Indicator};
pub use orchestrator::SyncOrchestrator;
pub use session::LineupSession;
