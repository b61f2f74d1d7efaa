//! Lineup record entity - one row per registered participant in one retreat

use serde::{Deserialize, Serialize};

use crate::value_objects::{GbsNumber, MemoId, RecordId};

/// Memo length limit, enforced client-side before any request
pub const MEMO_MAX_LEN: usize = 500;

/// Participant gender, used for the server-computed group balance counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
}

/// One participant's row on the lineup board.
///
/// Identity is the server-assigned `id`, immutable for the record's lifetime.
/// Staff mutate the assignment and memo fields; everything else is read-only
/// display data. The aggregate counts are recomputed server-side on every
/// mutation and arrive with the confirmed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupRecord {
    pub id: RecordId,

    // Profile (read-only here; registration owns it)
    pub name: String,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    // Assignment
    #[serde(default)]
    pub gbs_number: Option<GbsNumber>,
    #[serde(default)]
    pub is_leader: bool,

    // Annotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo_id: Option<MemoId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo_color: Option<String>,

    // Server-computed aggregates for the record's current group
    #[serde(default)]
    pub group_male_count: u32,
    #[serde(default)]
    pub group_female_count: u32,
    #[serde(default)]
    pub is_full_attendance: bool,
}

impl LineupRecord {
    /// Whether the assignment field may be edited on this row.
    ///
    /// Leaders' group numbers are server-managed; the client never opens an
    /// editor for them and never sends an assignment mutation.
    #[inline]
    pub fn assignment_editable(&self) -> bool {
        !self.is_leader
    }

    /// Whether the record currently has a memo entity
    #[inline]
    pub fn has_memo(&self) -> bool {
        self.memo_id.is_some()
    }

    /// Set the group assignment (optimistic, local only)
    pub fn set_gbs_number(&mut self, number: Option<GbsNumber>) {
        self.gbs_number = number;
    }

    /// Set the memo text/color (optimistic, local only)
    ///
    /// `memo_id` is untouched: on create the server assigns it with the
    /// confirmed record, on update it already exists.
    pub fn set_memo(&mut self, memo: String, color: Option<String>) {
        self.memo = Some(memo);
        self.memo_color = color;
    }

    /// Clear all memo fields (optimistic, local only)
    ///
    /// The record itself persists; memo deletion never deletes the row.
    pub fn clear_memo(&mut self) {
        self.memo = None;
        self.memo_id = None;
        self.memo_color = None;
    }
}
