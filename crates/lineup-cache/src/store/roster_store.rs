//! Roster store
//!
//! Holds the live `RosterSnapshot` per retreat using DashMap for thread-safe
//! access, and fans change events out to subscribers over a broadcast
//! channel. This is the only shared mutable state on the client; nothing
//! mutates a snapshot except through these primitives.

use dashmap::DashMap;
use lineup_core::events::{RecordUpdatedEvent, SnapshotReplacedEvent};
use lineup_core::{DomainError, LineupRecord, RetreatId, RosterEvent, RosterSnapshot};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Whether a local mutation should be overwritten by refreshes already in
/// flight when it was applied.
///
/// `No` marks optimistic writes: the store bumps the retreat's version so a
/// poll response fetched before the write is discarded on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revalidate {
    Yes,
    No,
}

/// Per-retreat cache entry
#[derive(Debug)]
struct CacheEntry {
    snapshot: RosterSnapshot,
    /// Bumped on every non-revalidating (locally applied) mutation.
    /// Refreshes capture it before fetching and drop stale responses.
    version: u64,
}

/// Shared handle to the roster store
pub type SharedRosterStore = Arc<RosterStore>;

/// The client's synchronization cache
pub struct RosterStore {
    entries: DashMap<RetreatId, CacheEntry>,
    events: broadcast::Sender<RosterEvent>,
}

impl RosterStore {
    /// Create a new store
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            entries: DashMap::new(),
            events,
        }
    }

    /// Create a new store wrapped in Arc
    #[must_use]
    pub fn new_shared() -> SharedRosterStore {
        Arc::new(Self::new())
    }

    /// Subscribe to cache change events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.events.subscribe()
    }

    /// Get a cloned copy of the current snapshot, if one is cached
    pub fn snapshot(&self, retreat_id: RetreatId) -> Option<RosterSnapshot> {
        self.entries.get(&retreat_id).map(|e| e.snapshot.clone())
    }

    /// Current version counter for a retreat (0 when nothing is cached)
    pub fn version(&self, retreat_id: RetreatId) -> u64 {
        self.entries.get(&retreat_id).map_or(0, |e| e.version)
    }

    /// Whether a snapshot is cached for the retreat
    pub fn contains(&self, retreat_id: RetreatId) -> bool {
        self.entries.contains_key(&retreat_id)
    }

    /// Install a full snapshot (initial load, room join, poll refresh).
    ///
    /// Deep-compares against the cached snapshot first: unchanged data does
    /// not publish an event, so views are spared a re-render cascade.
    /// Returns whether the cache changed.
    pub fn install(&self, snapshot: RosterSnapshot) -> bool {
        let retreat_id = snapshot.retreat_id;
        let changed = match self.entries.entry(retreat_id) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().snapshot == snapshot {
                    false
                } else {
                    occupied.get_mut().snapshot = snapshot;
                    true
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(CacheEntry {
                    snapshot,
                    version: 0,
                });
                true
            }
        };

        if changed {
            tracing::debug!(retreat_id = %retreat_id, "Snapshot installed");
            self.publish(RosterEvent::SnapshotReplaced(SnapshotReplacedEvent::new(
                retreat_id,
            )));
        }
        changed
    }

    /// Install a refresh result only if no local mutation was applied since
    /// `seen_version` was captured.
    ///
    /// This is the cross-channel ordering guard: an older poll response must
    /// not overwrite a newer applied value. No timestamps are compared; the
    /// most recently *applied* value wins.
    pub fn install_if_unchanged(&self, snapshot: RosterSnapshot, seen_version: u64) -> bool {
        let retreat_id = snapshot.retreat_id;
        let changed = match self.entries.entry(retreat_id) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().version != seen_version {
                    tracing::debug!(
                        retreat_id = %retreat_id,
                        seen_version,
                        version = occupied.get().version,
                        "Discarding stale refresh response"
                    );
                    return false;
                }
                if occupied.get().snapshot == snapshot {
                    false
                } else {
                    occupied.get_mut().snapshot = snapshot;
                    true
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                if seen_version != 0 {
                    return false;
                }
                vacant.insert(CacheEntry {
                    snapshot,
                    version: 0,
                });
                true
            }
        };

        if changed {
            self.publish(RosterEvent::SnapshotReplaced(SnapshotReplacedEvent::new(
                retreat_id,
            )));
        }
        changed
    }

    /// Mutate the cached snapshot through an updater closure.
    ///
    /// The exclusive mutation primitive of the cache. `Revalidate::No` marks
    /// the write as locally applied (optimistic) and bumps the version
    /// counter so in-flight refreshes are discarded.
    pub fn mutate<F>(
        &self,
        retreat_id: RetreatId,
        updater: F,
        revalidate: Revalidate,
    ) -> Result<(), DomainError>
    where
        F: FnOnce(&mut RosterSnapshot),
    {
        let mut entry = self
            .entries
            .get_mut(&retreat_id)
            .ok_or(DomainError::SnapshotMissing(retreat_id))?;

        updater(&mut entry.snapshot);
        if revalidate == Revalidate::No {
            entry.version += 1;
        }
        drop(entry);

        self.publish(RosterEvent::SnapshotReplaced(SnapshotReplacedEvent::new(
            retreat_id,
        )));
        Ok(())
    }

    /// Merge one confirmed or broadcast record into the cached snapshot.
    ///
    /// Publishes `RecordUpdated` only when the stored value actually changed.
    /// Counts as a local apply for ordering purposes: a poll started before
    /// this record arrived must not overwrite it.
    pub fn apply_record(&self, retreat_id: RetreatId, record: LineupRecord) -> Result<bool, DomainError> {
        let mut entry = self
            .entries
            .get_mut(&retreat_id)
            .ok_or(DomainError::SnapshotMissing(retreat_id))?;

        let record_id = record.id;
        let changed = entry.snapshot.merge_record(record);
        if changed {
            entry.version += 1;
        }
        drop(entry);

        if changed {
            tracing::trace!(
                retreat_id = %retreat_id,
                record_id = %record_id,
                "Record merged into snapshot"
            );
            self.publish(RosterEvent::RecordUpdated(RecordUpdatedEvent::new(
                retreat_id, record_id,
            )));
        }
        Ok(changed)
    }

    /// Drop the cached snapshot for a retreat (session close)
    pub fn evict(&self, retreat_id: RetreatId) {
        if self.entries.remove(&retreat_id).is_some() {
            tracing::debug!(retreat_id = %retreat_id, "Snapshot evicted");
        }
    }

    /// Publish a cache event to subscribers (no receivers is fine)
    pub fn publish(&self, event: RosterEvent) {
        let _ = self.events.send(event);
    }

    /// Number of cached retreats
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RosterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RosterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterStore")
            .field("retreats", &self.entries.len())
            .finish()
    }
}
