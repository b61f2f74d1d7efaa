//! Field edit buffer & conflict detector
//!
//! One [`FieldEditor`] per editable cell, an explicit state machine with no
//! ties to any UI framework. It owns the draft the user is typing, the last
//! value known saved, and - crucially - a buffer for external values that
//! arrive mid-edit. An inbound cache change never overwrites an active
//! draft; it is buffered and surfaced as a conflict the user resolves by
//! saving over it or by pressing escape to adopt it.
//!
//! The host wires it up like this: focus calls [`FieldEditor::begin_edit`],
//! keystrokes call [`FieldEditor::input`] (and arm the autosave debounce),
//! cache events for the record call [`FieldEditor::external_update`], blur
//! or Enter calls [`FieldEditor::commit`] (cancelling the debounce first),
//! and the save result lands in [`FieldEditor::save_succeeded`] or
//! [`FieldEditor::save_failed`].

use lineup_core::{GbsNumber, RecordId, MEMO_MAX_LEN};

/// Which editable field this editor instance owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// The group number cell (numeric input)
    Assignment,
    /// The memo cell (free text)
    Memo,
}

/// Editor state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Not being edited; external updates apply directly
    Idle,
    /// User is typing; external updates buffer instead of applying
    Editing,
    /// A save is in flight
    Saving,
    /// Editing, with a buffered external value awaiting resolution
    ConflictPending,
}

/// Transient feedback for the host to show briefly, then clear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Saved,
    Failed,
    Invalid,
}

/// What a commit decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Draft equals last saved; nothing to send
    NoChange,
    /// Input failed validation; draft reverted, nothing sent
    Invalid,
    /// Send this value; call `save_succeeded`/`save_failed` with the result
    Save(String),
}

/// Per-field edit buffer and conflict detector
#[derive(Debug, Clone)]
pub struct FieldEditor {
    field: FieldKind,
    record_id: RecordId,
    /// Leader rows: assignment editing permanently refused
    locked: bool,
    state: EditorState,
    draft: String,
    last_saved: String,
    buffered: Option<String>,
    indicator: Option<Indicator>,
}

impl FieldEditor {
    /// Create an editor over the field's last confirmed value.
    ///
    /// `locked` permanently disables editing (leader assignment cells).
    pub fn new(
        field: FieldKind,
        record_id: RecordId,
        confirmed: impl Into<String>,
        locked: bool,
    ) -> Self {
        let confirmed = confirmed.into();
        Self {
            field,
            record_id,
            locked,
            state: EditorState::Idle,
            draft: confirmed.clone(),
            last_saved: confirmed,
            buffered: None,
            indicator: None,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn field(&self) -> FieldKind {
        self.field
    }

    pub fn record_id(&self) -> RecordId {
        self.record_id
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    /// The value the cell should display
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn last_saved(&self) -> &str {
        &self.last_saved
    }

    /// Whether a conflicting external value is buffered
    pub fn has_conflict(&self) -> bool {
        self.buffered.is_some()
    }

    /// The buffered external value, if a conflict is pending
    pub fn buffered_value(&self) -> Option<&str> {
        self.buffered.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Read and clear the transient indicator
    pub fn take_indicator(&mut self) -> Option<Indicator> {
        self.indicator.take()
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// `Idle -> Editing` on focus/click. Returns whether editing started.
    pub fn begin_edit(&mut self) -> bool {
        if self.locked || self.state != EditorState::Idle {
            return false;
        }
        self.draft = self.last_saved.clone();
        self.state = EditorState::Editing;
        true
    }

    /// Keystroke: update the draft. Ignored outside of editing.
    pub fn input(&mut self, value: impl Into<String>) {
        if matches!(
            self.state,
            EditorState::Editing | EditorState::ConflictPending
        ) {
            self.draft = value.into();
        }
    }

    /// An update for this record arrived from the cache.
    ///
    /// Idle editors follow the cache. Active editors never lose their draft:
    /// a value equal to the draft or the last-saved value is absorbed
    /// silently, anything else is buffered and flagged as a conflict.
    pub fn external_update(&mut self, value: impl Into<String>) {
        let value = value.into();
        match self.state {
            EditorState::Idle => {
                self.last_saved = value.clone();
                self.draft = value;
            }
            EditorState::Editing | EditorState::ConflictPending | EditorState::Saving => {
                if value == self.draft || value == self.last_saved {
                    // Someone else wrote what we already have; not a conflict
                    self.last_saved = value;
                    if self
                        .buffered
                        .as_ref()
                        .is_some_and(|b| *b == self.last_saved)
                    {
                        self.buffered = None;
                        if self.state == EditorState::ConflictPending {
                            self.state = EditorState::Editing;
                        }
                    }
                    return;
                }

                tracing::debug!(
                    record_id = %self.record_id,
                    field = ?self.field,
                    "Concurrent edit detected, buffering external value"
                );
                self.buffered = Some(value);
                if self.state == EditorState::Editing {
                    self.state = EditorState::ConflictPending;
                }
            }
        }
    }

    /// Blur or explicit confirm: decide whether to save.
    ///
    /// Only meaningful while editing. Validation runs first; invalid input
    /// reverts the draft without a network call. The caller must cancel any
    /// pending autosave before invoking the save, then report the result via
    /// [`Self::save_succeeded`] / [`Self::save_failed`].
    pub fn commit(&mut self) -> CommitOutcome {
        if !matches!(
            self.state,
            EditorState::Editing | EditorState::ConflictPending
        ) {
            return CommitOutcome::NoChange;
        }

        if self.draft == self.last_saved {
            self.finish_idle();
            return CommitOutcome::NoChange;
        }

        if !self.validate() {
            self.draft = self.last_saved.clone();
            self.indicator = Some(Indicator::Invalid);
            self.state = if self.buffered.is_some() {
                EditorState::ConflictPending
            } else {
                EditorState::Editing
            };
            return CommitOutcome::Invalid;
        }

        self.state = EditorState::Saving;
        CommitOutcome::Save(self.draft.clone())
    }

    /// `Saving -> Idle`: the save went through with this confirmed value
    pub fn save_succeeded(&mut self, confirmed: impl Into<String>) {
        if self.state != EditorState::Saving {
            return;
        }
        let confirmed = confirmed.into();
        self.last_saved = confirmed.clone();
        self.draft = confirmed;
        // Our write is the newest applied value; a buffered broadcast from
        // before the ack lost the race
        self.buffered = None;
        self.indicator = Some(Indicator::Saved);
        self.state = EditorState::Idle;
    }

    /// `Saving -> Editing`: the save failed; draft reverts to last saved
    pub fn save_failed(&mut self) {
        if self.state != EditorState::Saving {
            return;
        }
        self.draft = self.last_saved.clone();
        self.indicator = Some(Indicator::Failed);
        self.state = if self.buffered.is_some() {
            EditorState::ConflictPending
        } else {
            EditorState::Editing
        };
    }

    /// Escape: leave editing.
    ///
    /// With a buffered external value, escape *adopts* it - the conflict
    /// resolves in favor of the other editor's write. Otherwise the draft
    /// reverts to the last saved value.
    pub fn cancel(&mut self) {
        if !matches!(
            self.state,
            EditorState::Editing | EditorState::ConflictPending
        ) {
            return;
        }
        if let Some(buffered) = self.buffered.take() {
            self.last_saved = buffered.clone();
            self.draft = buffered;
        } else {
            self.draft = self.last_saved.clone();
        }
        self.state = EditorState::Idle;
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn finish_idle(&mut self) {
        // Dissolving the edit session releases any buffered value into place
        if let Some(buffered) = self.buffered.take() {
            self.last_saved = buffered.clone();
            self.draft = buffered;
        }
        self.state = EditorState::Idle;
    }

    fn validate(&self) -> bool {
        match self.field {
            FieldKind::Assignment => GbsNumber::parse_assignment(&self.draft).is_ok(),
            FieldKind::Memo => self.draft.chars().count() <= MEMO_MAX_LEN,
        }
    }
}
