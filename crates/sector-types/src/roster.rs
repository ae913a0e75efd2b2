//! The community authorization roster

use crate::ids::Cid;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The set of identities permitted to staff tracked positions.
///
/// The roster is replaced wholesale on each successful refresh and
/// never partially merged. It is empty only until the first successful
/// fetch; a failed refresh leaves the previous set in place, since a
/// stale roster is always preferable to an empty one (an empty roster
/// would flag every active position as rogue).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    cids: HashSet<Cid>,
    last_refreshed: Option<chrono::DateTime<chrono::Utc>>,
}

impl Roster {
    /// An empty roster (pre-first-fetch state).
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole set and stamp the refresh time.
    pub fn replace(&mut self, cids: HashSet<Cid>) {
        self.cids = cids;
        self.last_refreshed = Some(chrono::Utc::now());
    }

    /// Whether an identity is authorized.
    pub fn contains(&self, cid: &Cid) -> bool {
        self.cids.contains(cid)
    }

    /// Number of authorized identities.
    pub fn len(&self) -> usize {
        self.cids.len()
    }

    /// True until the first successful refresh.
    pub fn is_empty(&self) -> bool {
        self.cids.is_empty()
    }

    /// When the roster was last successfully refreshed.
    pub fn last_refreshed(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.last_refreshed
    }
}
