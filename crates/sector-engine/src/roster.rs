//! Failure-tolerant roster cache

use crate::error::EngineResult;
use crate::sources::RosterSource;
use sector_types::{Cid, Roster};
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Caches the authorization roster between refreshes.
///
/// The roster task is the sole writer; every other component takes
/// read snapshots. On a failed refresh the previous set is retained
/// unchanged, so transient upstream trouble never empties the roster.
pub struct RosterCache {
    inner: RwLock<Roster>,
}

impl RosterCache {
    /// An empty cache; stays empty until the first successful refresh.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Roster::new()),
        }
    }

    /// Refresh from the roster service, replacing the cached set with
    /// staff ∪ controllers on success. On any failure the cache is
    /// left untouched and the error is propagated for the caller to
    /// log; a single failed refresh is not alarming.
    pub async fn refresh(&self, source: &dyn RosterSource) -> EngineResult<usize> {
        let snapshot = source.fetch().await?;

        let cids: HashSet<Cid> = snapshot
            .staff
            .into_iter()
            .chain(snapshot.controllers)
            .collect();
        let total = cids.len();

        self.inner.write().await.replace(cids);
        Ok(total)
    }

    /// Read snapshot of the current roster.
    pub async fn snapshot(&self) -> Roster {
        self.inner.read().await.clone()
    }

    /// Whether an identity is currently authorized.
    pub async fn contains(&self, cid: &Cid) -> bool {
        self.inner.read().await.contains(cid)
    }
}

impl Default for RosterCache {
    fn default() -> Self {
        Self::new()
    }
}
