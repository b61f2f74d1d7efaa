//! Roster events - what the cache tells its subscribers
//!
//! These events drive view re-renders and user-facing notifications:
//! - a single record changed (push broadcast or confirmed mutation)
//! - the whole snapshot was replaced (poll refresh, room join)
//! - a refresh failed after retries (stale-while-error)
//! - the push channel degraded to polling-only

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{RecordId, RetreatId};

/// All events published by the synchronization cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RosterEvent {
    RecordUpdated(RecordUpdatedEvent),
    SnapshotReplaced(SnapshotReplacedEvent),
    RefreshFailed(RefreshFailedEvent),
    ChannelDegraded(ChannelDegradedEvent),
}

impl RosterEvent {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RecordUpdated(_) => "RECORD_UPDATED",
            Self::SnapshotReplaced(_) => "SNAPSHOT_REPLACED",
            Self::RefreshFailed(_) => "REFRESH_FAILED",
            Self::ChannelDegraded(_) => "CHANNEL_DEGRADED",
        }
    }

    /// Retreat the event belongs to
    pub fn retreat_id(&self) -> RetreatId {
        match self {
            Self::RecordUpdated(e) => e.retreat_id,
            Self::SnapshotReplaced(e) => e.retreat_id,
            Self::RefreshFailed(e) => e.retreat_id,
            Self::ChannelDegraded(e) => e.retreat_id,
        }
    }

    /// Get the timestamp of the event
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::RecordUpdated(e) => e.timestamp,
            Self::SnapshotReplaced(e) => e.timestamp,
            Self::RefreshFailed(e) => e.timestamp,
            Self::ChannelDegraded(e) => e.timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordUpdatedEvent {
    pub retreat_id: RetreatId,
    pub record_id: RecordId,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotReplacedEvent {
    pub retreat_id: RetreatId,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshFailedEvent {
    pub retreat_id: RetreatId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelDegradedEvent {
    pub retreat_id: RetreatId,
    pub timestamp: DateTime<Utc>,
}

impl RecordUpdatedEvent {
    pub fn new(retreat_id: RetreatId, record_id: RecordId) -> Self {
        Self {
            retreat_id,
            record_id,
            timestamp: Utc::now(),
        }
    }
}

impl SnapshotReplacedEvent {
    pub fn new(retreat_id: RetreatId) -> Self {
        Self {
            retreat_id,
            timestamp: Utc::now(),
        }
    }
}

impl RefreshFailedEvent {
    pub fn new(retreat_id: RetreatId, message: impl Into<String>) -> Self {
        Self {
            retreat_id,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl ChannelDegradedEvent {
    pub fn new(retreat_id: RetreatId) -> Self {
        Self {
            retreat_id,
            timestamp: Utc::now(),
        }
    }
}
