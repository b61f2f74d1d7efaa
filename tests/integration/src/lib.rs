//! Integration test support for the lineup synchronization core
//!
//! Provides roster fixtures, an in-memory mock transport that behaves like
//! the backend (including server-side aggregate recomputation), and an
//! in-process WebSocket server speaking the push protocol.

pub mod fixtures;

pub use fixtures::{leader, participant, sample_roster};
pub use helpers::{MockPushServer, MockTransport};
