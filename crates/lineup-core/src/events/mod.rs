//! Roster events - emitted by the synchronization cache to subscribed views

mod roster_event;

pub use roster_event::{
    ChannelDegradedEvent, RecordUpdatedEvent, RefreshFailedEvent, RosterEvent,
    SnapshotReplacedEvent,
};
