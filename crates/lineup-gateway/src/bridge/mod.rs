//! Push bridge connection management

mod backoff;
mod push_bridge;

pub use backoff::ReconnectBackoff;
pub use push_bridge::{BridgeState, PushBridge, PushBridgeConfig};
