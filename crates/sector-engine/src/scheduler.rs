//! Engine loops and scheduling
//!
//! Three independently paced repeating tasks share the in-memory
//! state under a single-writer discipline: the presence poll writes
//! tracker state, the roster refresh writes roster state, and the
//! membership reconciliation only reads. An error inside any cycle is
//! caught at the task boundary, logged, and followed by a short
//! backoff; the loop then continues to its next scheduled cycle.

use crate::error::EngineResult;
use crate::notify::Dispatcher;
use crate::reconciler::MembershipReconciler;
use crate::roster::RosterCache;
use crate::sources::{FeedSource, GuildGateway, RosterSource};
use crate::tracker::StatusTracker;
use sector_types::{Callsign, Cid, LiveSession};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval, Duration};

/// Cycle cadences and failure backoff.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Presence poll period in seconds
    pub poll_interval_secs: u64,

    /// Membership reconciliation period in seconds
    pub reconcile_interval_secs: u64,

    /// Roster refresh period in seconds; the roster changes far less
    /// often than presence, so it runs on a much coarser cadence
    pub roster_refresh_interval_secs: u64,

    /// Pause after a failed cycle before resuming the schedule
    pub error_backoff_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            reconcile_interval_secs: 60,
            roster_refresh_interval_secs: 3600,
            error_backoff_secs: 60,
        }
    }
}

/// The presence reconciliation and notification engine.
pub struct Engine {
    config: EngineConfig,
    tracker: Arc<RwLock<StatusTracker>>,
    roster: Arc<RosterCache>,
    reconciler: Mutex<MembershipReconciler>,
    feed: Arc<dyn FeedSource>,
    roster_source: Arc<dyn RosterSource>,
    gateway: Arc<dyn GuildGateway>,
    dispatcher: Dispatcher,
    running: Arc<RwLock<bool>>,
}

impl Engine {
    /// Assemble an engine over the given transports.
    pub fn new(
        config: EngineConfig,
        tracker: StatusTracker,
        feed: Arc<dyn FeedSource>,
        roster_source: Arc<dyn RosterSource>,
        gateway: Arc<dyn GuildGateway>,
        dispatcher: Dispatcher,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            tracker: Arc::new(RwLock::new(tracker)),
            roster: Arc::new(RosterCache::new()),
            reconciler: Mutex::new(MembershipReconciler::new()),
            feed,
            roster_source,
            gateway,
            dispatcher,
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Shared handle to per-callsign presence state (read-only use
    /// outside the presence task).
    pub fn tracker(&self) -> Arc<RwLock<StatusTracker>> {
        self.tracker.clone()
    }

    /// Shared handle to the roster cache.
    pub fn roster(&self) -> Arc<RosterCache> {
        self.roster.clone()
    }

    /// Start the engine loops; resolves when [`Engine::stop`] is
    /// called.
    pub async fn start(self: Arc<Self>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        let tracked = self.tracker.read().await.len();
        tracing::info!(tracked, "Engine started");

        let poll_engine = self.clone();
        let poll_handle = tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(poll_engine.config.poll_interval_secs));

            loop {
                interval.tick().await;

                if !*poll_engine.running.read().await {
                    break;
                }

                if let Err(e) = poll_engine.presence_cycle().await {
                    tracing::error!(error = %e, "Presence poll cycle failed");
                    poll_engine.backoff().await;
                }
            }
        });

        let reconcile_engine = self.clone();
        let reconcile_handle = tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(
                reconcile_engine.config.reconcile_interval_secs,
            ));

            loop {
                interval.tick().await;

                if !*reconcile_engine.running.read().await {
                    break;
                }

                if let Err(e) = reconcile_engine.reconcile_cycle().await {
                    tracing::error!(error = %e, "Membership reconciliation cycle failed");
                    reconcile_engine.backoff().await;
                }
            }
        });

        let roster_engine = self.clone();
        let roster_handle = tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(
                roster_engine.config.roster_refresh_interval_secs,
            ));

            loop {
                interval.tick().await;

                if !*roster_engine.running.read().await {
                    break;
                }

                if let Err(e) = roster_engine.roster_cycle().await {
                    tracing::error!(error = %e, "Roster refresh failed");
                    roster_engine.backoff().await;
                }
            }
        });

        // Wait for shutdown
        tokio::select! {
            _ = poll_handle => {}
            _ = reconcile_handle => {}
            _ = roster_handle => {}
        }

        tracing::info!("Engine stopped");
    }

    /// Stop the engine loops at their next cycle boundary.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    async fn backoff(&self) {
        tokio::time::sleep(Duration::from_secs(self.config.error_backoff_secs)).await;
    }

    /// One presence poll: fetch, detect all transitions, then
    /// dispatch. Detection for every callsign completes before the
    /// first notification goes out.
    async fn presence_cycle(&self) -> EngineResult<()> {
        let sessions = self.feed.fetch().await?;
        if sessions.is_empty() {
            tracing::warn!("No session data received from feed");
            return Ok(());
        }

        tracing::debug!(sessions = sessions.len(), "Retrieved live sessions");

        let snapshot: HashMap<Callsign, LiveSession> = sessions
            .into_iter()
            .map(|session| (session.callsign.clone(), session))
            .collect();
        let roster = self.roster.snapshot().await;

        let events = {
            let mut tracker = self.tracker.write().await;
            tracker.observe(&snapshot, &roster)
        };

        for event in &events {
            self.dispatcher.dispatch(event).await;
        }

        Ok(())
    }

    /// One membership reconciliation: identities online on tracked
    /// positions, converged against the guild's role holders.
    async fn reconcile_cycle(&self) -> EngineResult<()> {
        let sessions = self.feed.fetch().await?;

        let tracked: HashSet<Callsign> = {
            let tracker = self.tracker.read().await;
            tracker.callsigns().cloned().collect()
        };

        let online_cids: HashSet<Cid> = sessions
            .iter()
            .filter(|session| tracked.contains(&session.callsign))
            .map(|session| session.cid.clone())
            .collect();

        tracing::debug!(online = online_cids.len(), "Tracked positions online");

        let mut reconciler = self.reconciler.lock().await;
        let outcome = reconciler
            .reconcile(self.gateway.as_ref(), &online_cids)
            .await?;

        if outcome.granted > 0 || outcome.revoked > 0 {
            tracing::info!(
                granted = outcome.granted,
                revoked = outcome.revoked,
                "Membership reconciliation applied changes"
            );
        }

        Ok(())
    }

    /// One roster refresh. The cache keeps its previous contents on
    /// failure.
    async fn roster_cycle(&self) -> EngineResult<()> {
        tracing::info!("Starting roster refresh");
        let total = self.roster.refresh(self.roster_source.as_ref()).await?;
        tracing::info!(total, "Roster refresh completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChannelError, GatewayError, SourceError};
    use crate::sources::{GuildMember, MemberId, NotifyChannel, RosterSnapshot};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    struct FakeFeed {
        sessions: StdMutex<Result<Vec<LiveSession>, ()>>,
    }

    impl FakeFeed {
        fn with(sessions: Vec<LiveSession>) -> Arc<Self> {
            Arc::new(Self {
                sessions: StdMutex::new(Ok(sessions)),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                sessions: StdMutex::new(Err(())),
            })
        }
    }

    #[async_trait]
    impl FeedSource for FakeFeed {
        async fn fetch(&self) -> Result<Vec<LiveSession>, SourceError> {
            self.sessions
                .lock()
                .unwrap()
                .clone()
                .map_err(|_| SourceError::Status { status: 500 })
        }
    }

    struct FakeRoster;

    #[async_trait]
    impl RosterSource for FakeRoster {
        async fn fetch(&self) -> Result<RosterSnapshot, SourceError> {
            Ok(RosterSnapshot {
                staff: vec![Cid::from(100)],
                controllers: vec![Cid::from(200)],
            })
        }
    }

    #[derive(Default)]
    struct FakeGuild {
        members: Vec<GuildMember>,
        grants: StdMutex<Vec<MemberId>>,
    }

    #[async_trait]
    impl GuildGateway for FakeGuild {
        async fn members(&self) -> Result<Vec<GuildMember>, GatewayError> {
            Ok(self.members.clone())
        }

        async fn grant_role(&self, member: &MemberId) -> Result<(), GatewayError> {
            self.grants.lock().unwrap().push(member.clone());
            Ok(())
        }

        async fn revoke_role(&self, _member: &MemberId) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    struct RecordingChannel {
        name: &'static str,
        sent: StdMutex<Vec<String>>,
    }

    impl RecordingChannel {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                sent: StdMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl NotifyChannel for RecordingChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, text: &str) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn session(callsign: &str, name: &str, cid: u64) -> LiveSession {
        LiveSession {
            callsign: Callsign::new(callsign),
            name: name.to_string(),
            cid: Cid::from(cid),
        }
    }

    fn engine_with(
        feed: Arc<FakeFeed>,
        gateway: Arc<FakeGuild>,
        primary: Arc<RecordingChannel>,
        secondary: Arc<RecordingChannel>,
    ) -> Arc<Engine> {
        Engine::new(
            EngineConfig::default(),
            StatusTracker::new([Callsign::new("ABC123")]),
            feed,
            Arc::new(FakeRoster),
            gateway,
            Dispatcher::new(primary, secondary),
        )
    }

    #[tokio::test]
    async fn test_presence_cycle_detects_then_dispatches() {
        let primary = RecordingChannel::new("guild");
        let secondary = RecordingChannel::new("telegram");
        let engine = engine_with(
            FakeFeed::with(vec![session("ABC123", "John Doe", 900001)]),
            Arc::new(FakeGuild::default()),
            primary.clone(),
            secondary.clone(),
        );

        engine.presence_cycle().await.unwrap();

        // Empty roster at startup: online + rogue, on both channels
        let sent = primary.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("is now online"));
        assert!(sent[1].contains("ROGUE CONNECTION DETECTED"));
        assert_eq!(secondary.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_snapshot_produces_no_transitions() {
        let primary = RecordingChannel::new("guild");
        let secondary = RecordingChannel::new("telegram");
        let engine = engine_with(
            FakeFeed::with(vec![]),
            Arc::new(FakeGuild::default()),
            primary.clone(),
            secondary,
        );

        engine.presence_cycle().await.unwrap();

        assert!(primary.sent.lock().unwrap().is_empty());
        assert_eq!(
            engine.tracker().read().await.state_of(&Callsign::new("ABC123")),
            sector_types::PresenceState::Unknown
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_propagates_without_state_change() {
        let primary = RecordingChannel::new("guild");
        let secondary = RecordingChannel::new("telegram");
        let engine = engine_with(
            FakeFeed::failing(),
            Arc::new(FakeGuild::default()),
            primary.clone(),
            secondary,
        );

        assert!(engine.presence_cycle().await.is_err());
        assert!(primary.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_cycle_restricted_to_tracked_positions() {
        let gateway = Arc::new(FakeGuild {
            members: vec![
                GuildMember {
                    id: MemberId::new("1"),
                    display_name: Some("Tracked Person - 900001".into()),
                    has_role: false,
                },
                GuildMember {
                    id: MemberId::new("2"),
                    display_name: Some("Other Person - 555555".into()),
                    has_role: false,
                },
            ],
            ..Default::default()
        });
        let engine = engine_with(
            // 900001 staffs a tracked position, 555555 does not
            FakeFeed::with(vec![
                session("ABC123", "Tracked Person", 900001),
                session("OTHER1", "Other Person", 555555),
            ]),
            gateway.clone(),
            RecordingChannel::new("guild"),
            RecordingChannel::new("telegram"),
        );

        engine.reconcile_cycle().await.unwrap();

        assert_eq!(*gateway.grants.lock().unwrap(), vec![MemberId::new("1")]);
    }

    #[tokio::test]
    async fn test_roster_cycle_populates_cache() {
        let engine = engine_with(
            FakeFeed::with(vec![]),
            Arc::new(FakeGuild::default()),
            RecordingChannel::new("guild"),
            RecordingChannel::new("telegram"),
        );

        engine.roster_cycle().await.unwrap();

        let roster = engine.roster().snapshot().await;
        assert_eq!(roster.len(), 2);
        assert!(roster.contains(&Cid::from(100)));
    }
}
