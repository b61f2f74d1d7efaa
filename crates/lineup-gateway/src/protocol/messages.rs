//! Push envelope format
//!
//! Every frame on the push channel is one JSON envelope: an event name, an
//! optional ack correlation id, and an optional data payload.

use lineup_core::{LineupRecord, RetreatId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AckPayload;

/// Event names on the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushEvent {
    // === Client → Server ===
    JoinRoom,
    LeaveRoom,
    UpdateGbsNumber,
    CreateMemo,
    UpdateMemo,
    DeleteMemo,

    // === Server → Client ===
    Ack,
    RecordUpdated,
}

impl PushEvent {
    /// The wire name of the event
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JoinRoom => "join-room",
            Self::LeaveRoom => "leave-room",
            Self::UpdateGbsNumber => "update-gbs-number",
            Self::CreateMemo => "create-memo",
            Self::UpdateMemo => "update-memo",
            Self::DeleteMemo => "delete-memo",
            Self::Ack => "ack",
            Self::RecordUpdated => "record-updated",
        }
    }

    /// Whether a client may send this event
    #[must_use]
    pub fn is_client_event(&self) -> bool {
        !matches!(self, Self::Ack | Self::RecordUpdated)
    }
}

impl std::fmt::Display for PushEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame on the push channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// Event name
    pub event: PushEvent,

    /// Ack correlation id (requests and their replies)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl PushEnvelope {
    // === Client Messages ===

    /// Create a request expecting an acknowledgement
    #[must_use]
    pub fn request(event: PushEvent, ack: u64, data: Value) -> Self {
        Self {
            event,
            ack: Some(ack),
            data: Some(data),
        }
    }

    /// Create a fire-and-forget emit
    #[must_use]
    pub fn emit(event: PushEvent, data: Value) -> Self {
        Self {
            event,
            ack: None,
            data: Some(data),
        }
    }

    /// `join-room` request carrying the room id
    #[must_use]
    pub fn join_room(retreat_id: RetreatId, ack: u64) -> Self {
        Self::request(PushEvent::JoinRoom, ack, json!({ "retreatId": retreat_id }))
    }

    /// `leave-room` emit
    #[must_use]
    pub fn leave_room(retreat_id: RetreatId) -> Self {
        Self::emit(PushEvent::LeaveRoom, json!({ "retreatId": retreat_id }))
    }

    // === Server Messages (constructed by tests and mock servers) ===

    /// Acknowledgement reply for a request
    #[must_use]
    pub fn ack_reply(ack: u64, payload: &AckPayload) -> Self {
        Self {
            event: PushEvent::Ack,
            ack: Some(ack),
            data: serde_json::to_value(payload).ok(),
        }
    }

    /// `record-updated` broadcast
    #[must_use]
    pub fn record_updated(record: &LineupRecord) -> Self {
        Self {
            event: PushEvent::RecordUpdated,
            ack: None,
            data: serde_json::to_value(record).ok(),
        }
    }

    // === Parsing ===

    /// Try to parse as an acknowledgement: (correlation id, payload)
    pub fn as_ack(&self) -> Option<(u64, AckPayload)> {
        if self.event != PushEvent::Ack {
            return None;
        }
        let id = self.ack?;
        let payload = self
            .data
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())?;
        Some((id, payload))
    }

    /// Try to parse as a `record-updated` broadcast
    pub fn as_record_updated(&self) -> Option<LineupRecord> {
        if self.event != PushEvent::RecordUpdated {
            return None;
        }
        self.data
            .as_ref()
            .and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    // === Utilities ===

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for PushEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ack {
            Some(ack) => write!(f, "PushEnvelope({}, ack={ack})", self.event),
            None => write!(f, "PushEnvelope({})", self.event),
        }
    }
}
