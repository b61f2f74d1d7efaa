//! Roster store

mod roster_store;

pub use roster_store::{Revalidate, RosterStore, SharedRosterStore};
