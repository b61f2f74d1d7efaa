//! Transport trait (port) - defines the interface for reaching the backend
//!
//! The domain layer defines what it needs from the network; the HTTP client
//! and the push-channel bridge both provide implementations, so the mutation
//! orchestrator is written once and works over either transport.

use async_trait::async_trait;

use crate::entities::LineupRecord;
use crate::error::DomainError;
use crate::value_objects::{GbsNumber, MemoId, RecordId, RetreatId};

/// Result type for transport operations
pub type ApiResult<T> = Result<T, DomainError>;

/// Memo payload for create/update requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoInput {
    pub memo: String,
    pub color: Option<String>,
}

impl MemoInput {
    pub fn new(memo: impl Into<String>) -> Self {
        Self {
            memo: memo.into(),
            color: None,
        }
    }

    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Backend access for one retreat's lineup.
///
/// Every mutation resolves with the server-confirmed record (carrying the
/// recomputed aggregates), distinct from the broadcast other clients receive.
#[async_trait]
pub trait LineupTransport: Send + Sync {
    /// Fetch the full roster
    async fn fetch_roster(&self, retreat_id: RetreatId) -> ApiResult<Vec<LineupRecord>>;

    /// Assign or unassign a group number (`None` unassigns)
    async fn update_gbs_number(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        gbs_number: Option<GbsNumber>,
    ) -> ApiResult<LineupRecord>;

    /// Create a memo on a record (server assigns the memo id)
    async fn create_memo(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        input: MemoInput,
    ) -> ApiResult<LineupRecord>;

    /// Update an existing memo, addressed by its memo id
    async fn update_memo(
        &self,
        retreat_id: RetreatId,
        memo_id: MemoId,
        input: MemoInput,
    ) -> ApiResult<LineupRecord>;

    /// Delete an existing memo (the record persists with memo fields cleared)
    async fn delete_memo(&self, retreat_id: RetreatId, memo_id: MemoId)
        -> ApiResult<LineupRecord>;

    /// Short transport name for logs ("http", "push")
    fn describe(&self) -> &'static str;
}
