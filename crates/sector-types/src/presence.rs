//! Presence states and live feed sessions

use crate::ids::{Callsign, Cid};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Last-known presence of a tracked position.
///
/// Every position starts as `Unknown`; only the status tracker moves
/// it from there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    /// Not yet observed since startup
    #[default]
    Unknown,
    /// Present in the most recent successful snapshot
    Online,
    /// Previously online, now absent from the snapshot
    Offline,
}

impl fmt::Display for PresenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenceState::Unknown => f.write_str("unknown"),
            PresenceState::Online => f.write_str("online"),
            PresenceState::Offline => f.write_str("offline"),
        }
    }
}

/// One record from the live-session feed.
///
/// Ephemeral: lives only for the poll cycle it was observed in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSession {
    /// Position the connection is staffing
    pub callsign: Callsign,

    /// Display name reported by the feed
    pub name: String,

    /// Network identity behind the connection
    pub cid: Cid,
}
