//! Push channel wire protocol

mod ack;
mod messages;

pub use ack::{AckPayload, AckStatus};
pub use messages::{PushEnvelope, PushEvent};
