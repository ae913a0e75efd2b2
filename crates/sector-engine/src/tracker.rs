//! Per-callsign presence state machine
//!
//! Converts successive feed snapshots into transition events. The
//! tracker is the single writer of presence state; everything else
//! reads.

use sector_types::{Callsign, LiveSession, PresenceState, Roster, WatchEvent};
use std::collections::HashMap;

/// Tracks last-known presence for the fixed set of callsigns.
///
/// The tracked set is created once at startup and never grows or
/// shrinks. Until the first completed cycle the tracker is in a cold
/// start: positions that are already online when the process starts
/// are reported once, so operators learn the starting world state,
/// and not re-reported on later identical observations.
pub struct StatusTracker {
    states: HashMap<Callsign, PresenceState>,
    cold_start: bool,
}

impl StatusTracker {
    /// Create a tracker over the configured callsign list.
    pub fn new(callsigns: impl IntoIterator<Item = Callsign>) -> Self {
        let states = callsigns
            .into_iter()
            .map(|cs| (cs, PresenceState::Unknown))
            .collect();
        Self {
            states,
            cold_start: true,
        }
    }

    /// Apply one successful, non-empty snapshot and return the
    /// resulting transition events.
    ///
    /// A `RogueAlert` accompanies an online transition whenever the
    /// session's identity is absent from the roster at that moment.
    /// The caller must not invoke this for failed or empty fetches:
    /// only explicit absence from a successful snapshot counts as
    /// going offline.
    pub fn observe(
        &mut self,
        snapshot: &HashMap<Callsign, LiveSession>,
        roster: &Roster,
    ) -> Vec<WatchEvent> {
        let mut events = Vec::new();
        let cold_start = self.cold_start;

        for (callsign, state) in self.states.iter_mut() {
            match snapshot.get(callsign) {
                Some(session) => {
                    if cold_start || *state != PresenceState::Online {
                        tracing::debug!(
                            callsign = %callsign,
                            previous = %state,
                            "Status change detected"
                        );
                        events.push(WatchEvent::online(
                            callsign.clone(),
                            session.name.clone(),
                            session.cid.clone(),
                        ));
                        if !roster.contains(&session.cid) {
                            tracing::warn!(
                                callsign = %callsign,
                                cid = %session.cid,
                                "Rogue connection detected"
                            );
                            events.push(WatchEvent::RogueAlert {
                                callsign: callsign.clone(),
                                name: session.name.clone(),
                                cid: session.cid.clone(),
                            });
                        }
                    }
                    *state = PresenceState::Online;
                }
                None => {
                    if *state == PresenceState::Online {
                        tracing::info!(callsign = %callsign, "Position went offline");
                        events.push(WatchEvent::offline(callsign.clone()));
                        *state = PresenceState::Offline;
                    }
                }
            }
        }

        self.cold_start = false;
        events
    }

    /// Last-known state of a callsign; `Unknown` for untracked ones.
    pub fn state_of(&self, callsign: &Callsign) -> PresenceState {
        self.states.get(callsign).copied().unwrap_or_default()
    }

    /// The fixed tracked set.
    pub fn callsigns(&self) -> impl Iterator<Item = &Callsign> {
        self.states.keys()
    }

    /// Number of tracked callsigns.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the tracked set is empty.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
