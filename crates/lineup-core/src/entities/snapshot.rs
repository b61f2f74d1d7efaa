//! Roster snapshot - the client's latest known copy of one retreat's lineup

use serde::{Deserialize, Serialize};

use crate::entities::LineupRecord;
use crate::value_objects::{RecordId, RetreatId};

/// The full ordered roster for one retreat.
///
/// At most one snapshot is live per retreat per process; it is held by the
/// synchronization cache and every read goes through it. Deep structural
/// equality (`PartialEq`) is what decides whether an incoming snapshot is
/// actually a change worth publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterSnapshot {
    pub retreat_id: RetreatId,
    pub records: Vec<LineupRecord>,
}

impl RosterSnapshot {
    /// Create a snapshot from server records, preserving server order
    pub fn new(retreat_id: RetreatId, records: Vec<LineupRecord>) -> Self {
        Self {
            retreat_id,
            records,
        }
    }

    /// Create an empty snapshot
    pub fn empty(retreat_id: RetreatId) -> Self {
        Self::new(retreat_id, Vec::new())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Find a record by id
    pub fn find(&self, id: RecordId) -> Option<&LineupRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Find a record by id, mutably
    pub fn find_mut(&mut self, id: RecordId) -> Option<&mut LineupRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    /// Merge one confirmed record into the snapshot.
    ///
    /// The incoming record replaces the stored copy wholesale: server
    /// responses and broadcasts carry recomputed aggregate fields the client
    /// cannot derive locally. Unknown records are appended (a participant
    /// registered after the last full refresh). Returns whether anything
    /// actually changed.
    pub fn merge_record(&mut self, record: LineupRecord) -> bool {
        match self.find_mut(record.id) {
            Some(existing) => {
                if *existing == record {
                    false
                } else {
                    *existing = record;
                    true
                }
            }
            None => {
                self.records.push(record);
                true
            }
        }
    }

    /// Number of non-leader records with a group assigned (display aggregate)
    pub fn assigned_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| !r.is_leader && r.gbs_number.is_some())
            .count()
    }
}
