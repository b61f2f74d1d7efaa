//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{GbsNumberParseError, MemoId, RecordId, RetreatId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    #[error("Memo not found: {0}")]
    MemoNotFound(MemoId),

    #[error("No snapshot cached for retreat {0}")]
    SnapshotMissing(RetreatId),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid group number: {0}")]
    InvalidGbsNumber(#[from] GbsNumberParseError),

    #[error("Memo must not be empty")]
    EmptyMemo,

    #[error("Memo too long: max {max} characters")]
    MemoTooLong { max: usize },

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Leader group numbers are server-managed: {0}")]
    LeaderAssignmentForbidden(RecordId),

    #[error("Record {0} has no memo to modify")]
    MemoMissing(RecordId),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server rejected request: {message}")]
    ServerRejected { message: String, code: String },

    #[error("No acknowledgement within {timeout_ms}ms")]
    AckTimeout { timeout_ms: u64 },

    #[error("Push channel unavailable")]
    ChannelUnavailable,
}

impl DomainError {
    /// Get an error code string for logs and notifications
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::RecordNotFound(_) => "UNKNOWN_RECORD",
            Self::MemoNotFound(_) => "UNKNOWN_MEMO",
            Self::SnapshotMissing(_) => "SNAPSHOT_MISSING",

            // Validation
            Self::InvalidGbsNumber(_) => "INVALID_GBS_NUMBER",
            Self::EmptyMemo => "EMPTY_MEMO",
            Self::MemoTooLong { .. } => "MEMO_TOO_LONG",

            // Business Rules
            Self::LeaderAssignmentForbidden(_) => "LEADER_ASSIGNMENT_FORBIDDEN",
            Self::MemoMissing(_) => "MEMO_MISSING",

            // Transport
            Self::RequestFailed(_) => "REQUEST_FAILED",
            Self::ServerRejected { .. } => "SERVER_REJECTED",
            Self::AckTimeout { .. } => "ACK_TIMEOUT",
            Self::ChannelUnavailable => "CHANNEL_UNAVAILABLE",
        }
    }

    /// Check if this is a validation error (rejected before any network call)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidGbsNumber(_) | Self::EmptyMemo | Self::MemoTooLong { .. }
        )
    }

    /// Check if this is a transport error (the request itself failed)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_)
                | Self::ServerRejected { .. }
                | Self::AckTimeout { .. }
                | Self::ChannelUnavailable
        )
    }

    /// Check if retrying over a different transport could help
    pub fn is_channel_unavailable(&self) -> bool {
        matches!(self, Self::ChannelUnavailable)
    }
}
