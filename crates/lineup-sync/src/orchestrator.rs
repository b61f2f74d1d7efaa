//! Mutation orchestrator
//!
//! Every user-initiated change runs the same three-phase sequence:
//!
//! 1. apply the optimistic updater to the cache, marked non-revalidating so
//!    an in-flight stale refresh cannot overwrite it;
//! 2. issue the network mutation over whichever transport the caller chose;
//! 3. on success merge the server-confirmed record (it carries recomputed
//!    aggregates the optimistic guess could not know), on failure roll the
//!    touched field back and report the error.
//!
//! Updaters and rollbacks touch only their own field, so two in-flight
//! mutations on different fields of one record merge instead of clobbering
//! each other. Validation and the leader rule run before phase 1: a locally
//! rejected mutation leaves the cache untouched and issues no request.

use std::future::Future;
use std::sync::Arc;

use lineup_cache::{Revalidate, SharedRosterStore};
use lineup_core::{
    ApiResult, DomainError, GbsNumber, LineupRecord, LineupTransport, MemoInput, RecordId,
    RetreatId, MEMO_MAX_LEN,
};
use tracing::instrument;

/// Transport-agnostic mutation orchestrator
pub struct SyncOrchestrator {
    store: SharedRosterStore,
    transport: Arc<dyn LineupTransport>,
}

impl SyncOrchestrator {
    pub fn new(store: SharedRosterStore, transport: Arc<dyn LineupTransport>) -> Self {
        Self { store, transport }
    }

    /// The transport mutations go through
    pub fn transport(&self) -> &Arc<dyn LineupTransport> {
        &self.transport
    }

    /// Assign or unassign a group number (`None` unassigns).
    ///
    /// Leader rows are rejected locally: no cache change, no request.
    #[instrument(skip(self), fields(transport = self.transport.describe()))]
    pub async fn assign_gbs_number(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        gbs_number: Option<GbsNumber>,
    ) -> ApiResult<LineupRecord> {
        let record = self.current_record(retreat_id, record_id)?;
        if record.is_leader {
            return Err(DomainError::LeaderAssignmentForbidden(record_id));
        }
        let previous = record.gbs_number;

        self.perform(
            retreat_id,
            record_id,
            move |r| r.set_gbs_number(gbs_number),
            move |r| r.set_gbs_number(previous),
            self.transport.update_gbs_number(retreat_id, record_id, gbs_number),
            "Group number saved",
        )
        .await
    }

    /// Create a memo on a record without one
    #[instrument(skip(self, memo, color))]
    pub async fn create_memo(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        memo: String,
        color: Option<String>,
    ) -> ApiResult<LineupRecord> {
        Self::validate_memo(&memo)?;
        let record = self.current_record(retreat_id, record_id)?;
        let previous = MemoFields::of(&record);

        let input = MemoInput {
            memo: memo.clone(),
            color: color.clone(),
        };
        self.perform(
            retreat_id,
            record_id,
            move |r| r.set_memo(memo, color),
            move |r| previous.restore(r),
            self.transport.create_memo(retreat_id, record_id, input),
            "Memo created",
        )
        .await
    }

    /// Update an existing memo
    #[instrument(skip(self, memo, color))]
    pub async fn update_memo(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        memo: String,
        color: Option<String>,
    ) -> ApiResult<LineupRecord> {
        Self::validate_memo(&memo)?;
        let record = self.current_record(retreat_id, record_id)?;
        let memo_id = record.memo_id.ok_or(DomainError::MemoMissing(record_id))?;
        let previous = MemoFields::of(&record);

        let input = MemoInput {
            memo: memo.clone(),
            color: color.clone(),
        };
        self.perform(
            retreat_id,
            record_id,
            move |r| r.set_memo(memo, color),
            move |r| previous.restore(r),
            self.transport.update_memo(retreat_id, memo_id, input),
            "Memo updated",
        )
        .await
    }

    /// Delete an existing memo; the record persists with memo fields cleared
    #[instrument(skip(self))]
    pub async fn delete_memo(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
    ) -> ApiResult<LineupRecord> {
        let record = self.current_record(retreat_id, record_id)?;
        let memo_id = record.memo_id.ok_or(DomainError::MemoMissing(record_id))?;
        let previous = MemoFields::of(&record);

        self.perform(
            retreat_id,
            record_id,
            LineupRecord::clear_memo,
            move |r| previous.restore(r),
            self.transport.delete_memo(retreat_id, memo_id),
            "Memo deleted",
        )
        .await
    }

    /// Save whatever the memo editor committed: empty text deletes, text on
    /// a record without a memo creates, text on a record with one updates.
    pub async fn save_memo(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        memo: &str,
        color: Option<String>,
    ) -> ApiResult<LineupRecord> {
        let record = self.current_record(retreat_id, record_id)?;
        let text = memo.trim();

        if text.is_empty() {
            if record.memo_id.is_some() {
                self.delete_memo(retreat_id, record_id).await
            } else {
                // Nothing to clear; hand back the current record
                Ok(record)
            }
        } else if record.memo_id.is_some() {
            self.update_memo(retreat_id, record_id, text.to_string(), color)
                .await
        } else {
            self.create_memo(retreat_id, record_id, text.to_string(), color)
                .await
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn current_record(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
    ) -> ApiResult<LineupRecord> {
        let snapshot = self
            .store
            .snapshot(retreat_id)
            .ok_or(DomainError::SnapshotMissing(retreat_id))?;
        snapshot
            .find(record_id)
            .cloned()
            .ok_or(DomainError::RecordNotFound(record_id))
    }

    fn validate_memo(memo: &str) -> ApiResult<()> {
        if memo.trim().is_empty() {
            return Err(DomainError::EmptyMemo);
        }
        if memo.chars().count() > MEMO_MAX_LEN {
            return Err(DomainError::MemoTooLong { max: MEMO_MAX_LEN });
        }
        Ok(())
    }

    /// The shared three-phase sequence
    async fn perform<A, R, Fut>(
        &self,
        retreat_id: RetreatId,
        record_id: RecordId,
        apply: A,
        rollback: R,
        request: Fut,
        success_message: &'static str,
    ) -> ApiResult<LineupRecord>
    where
        A: FnOnce(&mut LineupRecord),
        R: FnOnce(&mut LineupRecord),
        Fut: Future<Output = ApiResult<LineupRecord>>,
    {
        // Phase 1: optimistic local apply, shielded from in-flight refreshes
        self.store.mutate(
            retreat_id,
            |snapshot| {
                if let Some(record) = snapshot.find_mut(record_id) {
                    apply(record);
                }
            },
            Revalidate::No,
        )?;

        // Phase 2: network
        match request.await {
            Ok(confirmed) => {
                // Phase 3: the confirmed record carries server-side aggregates
                self.store.apply_record(retreat_id, confirmed.clone())?;
                tracing::info!(
                    retreat_id = %retreat_id,
                    record_id = %record_id,
                    "{success_message}"
                );
                Ok(confirmed)
            }
            Err(e) => {
                // Phase 4: restore the touched field only
                let _ = self.store.mutate(
                    retreat_id,
                    |snapshot| {
                        if let Some(record) = snapshot.find_mut(record_id) {
                            rollback(record);
                        }
                    },
                    Revalidate::No,
                );
                tracing::warn!(
                    retreat_id = %retreat_id,
                    record_id = %record_id,
                    error = %e,
                    "Mutation failed, rolled back"
                );
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("transport", &self.transport.describe())
            .finish()
    }
}

/// Snapshot of the memo fields for field-level rollback
#[derive(Debug, Clone)]
struct MemoFields {
    memo: Option<String>,
    memo_id: Option<lineup_core::MemoId>,
    memo_color: Option<String>,
}

impl MemoFields {
    fn of(record: &LineupRecord) -> Self {
        Self {
            memo: record.memo.clone(),
            memo_id: record.memo_id,
            memo_color: record.memo_color.clone(),
        }
    }

    fn restore(self, record: &mut LineupRecord) {
        record.memo = self.memo;
        record.memo_id = self.memo_id;
        record.memo_color = self.memo_color;
    }
}
