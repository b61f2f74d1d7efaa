//! Request/response DTOs for the lineup REST endpoints

use lineup_core::{GbsNumber, RecordId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body for `PUT /retreats/{id}/lineups/gbs-number`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGbsNumberRequest {
    pub record_id: RecordId,
    /// `null` unassigns
    pub gbs_number: Option<GbsNumber>,
}

/// Body for memo create (`POST .../{recordId}/memo`) and update
/// (`PUT .../memo/{memoId}`)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemoRequest {
    #[validate(length(min = 1, max = 500))]
    pub memo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Error body the backend returns on non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}
