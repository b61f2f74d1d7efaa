//! # lineup-gateway
//!
//! The push channel bridge: a persistent WebSocket connection to the lineup
//! backend, scoped to per-retreat rooms. Mutation requests carry an
//! acknowledgement id and resolve with the server's reply; `record-updated`
//! broadcasts from other room members fan out to subscribers.
//!
//! Real-time freshness is an enhancement, never a dependency: when the
//! channel cannot be established or drops for good, the bridge degrades
//! silently (logged once) and the polling cache carries the session.

pub mod bridge;
pub mod protocol;

// Re-export bridge types
pub use bridge::{BridgeState, PushBridge, PushBridgeConfig, ReconnectBackoff};

// Re-export protocol types
pub use protocol::{AckPayload, AckStatus, PushEnvelope, PushEvent};
