//! Acknowledgement payloads
//!
//! Every client request carries an ack id; the server replies with this
//! payload. The originator of a mutation gets its deterministic result here,
//! distinct from the `record-updated` broadcast the other room members see.

use lineup_core::{ApiResult, DomainError, LineupRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acknowledgement outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AckStatus {
    Ok,
    Error,
}

/// Server acknowledgement for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckPayload {
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AckPayload {
    /// Successful ack carrying a data payload
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            status: AckStatus::Ok,
            data: Some(data),
            message: None,
            code: None,
        }
    }

    /// Error ack
    #[must_use]
    pub fn error(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Error,
            data: None,
            message: Some(message.into()),
            code: Some(code.into()),
        }
    }

    /// Unwrap into the data payload, mapping error acks to `DomainError`
    pub fn into_result(self) -> ApiResult<Value> {
        match self.status {
            AckStatus::Ok => Ok(self.data.unwrap_or(Value::Null)),
            AckStatus::Error => Err(DomainError::ServerRejected {
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
                code: self.code.unwrap_or_default(),
            }),
        }
    }

    /// Unwrap into a single confirmed record
    pub fn into_record(self) -> ApiResult<LineupRecord> {
        let data = self.into_result()?;
        serde_json::from_value(data)
            .map_err(|e| DomainError::RequestFailed(format!("invalid ack record: {e}")))
    }

    /// Unwrap into a full roster (join-room acks)
    pub fn into_records(self) -> ApiResult<Vec<LineupRecord>> {
        let data = self.into_result()?;
        serde_json::from_value(data)
            .map_err(|e| DomainError::RequestFailed(format!("invalid ack roster: {e}")))
    }
}
