//! Watch events emitted by the status tracker
//!
//! Events are transient: they exist only for the duration of a
//! dispatch call and are rendered independently per notification
//! channel.

use crate::ids::{Callsign, Cid};
use crate::presence::PresenceState;
use serde::{Deserialize, Serialize};

/// A presence transition or rogue-connection alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchEvent {
    /// A tracked position changed presence state.
    ///
    /// Offline transitions carry no name or identity; the feed no
    /// longer reports the connection by then.
    StatusChange {
        callsign: Callsign,
        name: Option<String>,
        cid: Option<Cid>,
        state: PresenceState,
    },

    /// A tracked position came online under an identity that is not
    /// on the authorization roster.
    RogueAlert {
        callsign: Callsign,
        name: String,
        cid: Cid,
    },
}

impl WatchEvent {
    /// An online transition for `callsign` staffed by `name`/`cid`.
    pub fn online(callsign: Callsign, name: impl Into<String>, cid: Cid) -> Self {
        WatchEvent::StatusChange {
            callsign,
            name: Some(name.into()),
            cid: Some(cid),
            state: PresenceState::Online,
        }
    }

    /// An offline transition for `callsign`.
    pub fn offline(callsign: Callsign) -> Self {
        WatchEvent::StatusChange {
            callsign,
            name: None,
            cid: None,
            state: PresenceState::Offline,
        }
    }

    /// The position this event concerns.
    pub fn callsign(&self) -> &Callsign {
        match self {
            WatchEvent::StatusChange { callsign, .. } => callsign,
            WatchEvent::RogueAlert { callsign, .. } => callsign,
        }
    }

    /// Whether this event is a rogue-connection alert.
    pub fn is_rogue(&self) -> bool {
        matches!(self, WatchEvent::RogueAlert { .. })
    }
}
