//! Platform connection supervisor
//!
//! Long-lived task keeping the platform session alive. Any transport
//! drop routes back through `Connecting` with a delay; only an
//! unrecoverable credential rejection reaches the terminal `Failed`
//! state, which takes the whole daemon down.

use crate::error::{DaemonError, DaemonResult};
use async_trait::async_trait;
use sector_clients::{ClientError, ClientResult, GuildClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session; waiting to reconnect
    Disconnected,
    /// Establishing/validating the session
    Connecting,
    /// Session validated; heartbeating
    Connected,
    /// Unrecoverable error; terminal
    Failed,
}

/// The session probe the supervisor drives.
#[async_trait]
pub trait IdentityProbe: Send + Sync {
    /// Validate the session, returning the authenticated identity.
    async fn probe(&self) -> ClientResult<String>;
}

#[async_trait]
impl IdentityProbe for GuildClient {
    async fn probe(&self) -> ClientResult<String> {
        self.identity().await
    }
}

/// Supervises the platform session, reconnecting indefinitely.
pub struct ConnectionSupervisor {
    probe: Arc<dyn IdentityProbe>,
    heartbeat: Duration,
    reconnect_delay: Duration,
    state: RwLock<ConnectionState>,
}

impl ConnectionSupervisor {
    /// Supervisor with the default cadences (60s heartbeat, 15s
    /// reconnect delay).
    pub fn new(probe: Arc<dyn IdentityProbe>) -> Self {
        Self::with_cadence(probe, Duration::from_secs(60), Duration::from_secs(15))
    }

    /// Supervisor with explicit cadences.
    pub fn with_cadence(
        probe: Arc<dyn IdentityProbe>,
        heartbeat: Duration,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            probe,
            heartbeat,
            reconnect_delay,
            state: RwLock::new(ConnectionState::Disconnected),
        }
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Run the supervision loop. Resolves only with an unrecoverable
    /// error; everything else reconnects forever.
    pub async fn run(&self) -> DaemonResult<()> {
        loop {
            self.set_state(ConnectionState::Connecting).await;
            tracing::info!("Connecting to platform");

            match self.probe.probe().await {
                Ok(identity) => {
                    self.set_state(ConnectionState::Connected).await;
                    tracing::info!(identity = %identity, "Connected to platform");

                    if let Err(err) = self.heartbeat_loop().await {
                        return Err(err);
                    }
                    // Transport drop: fall through to reconnect
                }
                Err(ClientError::Unauthorized) => {
                    self.set_state(ConnectionState::Failed).await;
                    return Err(DaemonError::ConnectionFailed(
                        "platform rejected credentials".into(),
                    ));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Platform connection attempt failed");
                }
            }

            self.set_state(ConnectionState::Disconnected).await;
            tracing::info!(
                delay_secs = self.reconnect_delay.as_secs(),
                "Disconnected from platform, will reconnect"
            );
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    /// Heartbeat until the session drops. `Ok(())` means a transport
    /// drop (recoverable); `Err` means credentials were rejected.
    async fn heartbeat_loop(&self) -> DaemonResult<()> {
        loop {
            tokio::time::sleep(self.heartbeat).await;

            match self.probe.probe().await {
                Ok(_) => {
                    tracing::debug!("Platform heartbeat ok");
                }
                Err(ClientError::Unauthorized) => {
                    self.set_state(ConnectionState::Failed).await;
                    return Err(DaemonError::ConnectionFailed(
                        "platform rejected credentials".into(),
                    ));
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Platform heartbeat failed");
                    return Ok(());
                }
            }
        }
    }

    async fn set_state(&self, next: ConnectionState) {
        *self.state.write().await = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Probe scripted with a sequence of outcomes; repeats the last.
    struct ScriptedProbe {
        script: Vec<Result<(), ScriptedError>>,
        cursor: AtomicUsize,
    }

    #[derive(Clone, Copy)]
    enum ScriptedError {
        Unauthorized,
        Transport,
    }

    impl ScriptedProbe {
        fn new(script: Vec<Result<(), ScriptedError>>) -> Arc<Self> {
            Arc::new(Self {
                script,
                cursor: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityProbe for ScriptedProbe {
        async fn probe(&self) -> ClientResult<String> {
            let index = self.cursor.fetch_add(1, Ordering::SeqCst);
            let step = self.script[index.min(self.script.len() - 1)];
            match step {
                Ok(()) => Ok("sectord".to_string()),
                Err(ScriptedError::Unauthorized) => Err(ClientError::Unauthorized),
                Err(ScriptedError::Transport) => Err(ClientError::Status { status: 502 }),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_credentials_terminate() {
        let probe = ScriptedProbe::new(vec![Err(ScriptedError::Unauthorized)]);
        let supervisor = ConnectionSupervisor::new(probe);

        let result = supervisor.run().await;
        assert!(matches!(result, Err(DaemonError::ConnectionFailed(_))));
        assert_eq!(supervisor.state().await, ConnectionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_drop_reconnects() {
        // Connect, heartbeat fails (transport), reconnect fails with
        // a credential rejection to make the loop terminate.
        let probe = ScriptedProbe::new(vec![
            Ok(()),
            Err(ScriptedError::Transport),
            Err(ScriptedError::Unauthorized),
        ]);
        let supervisor = ConnectionSupervisor::new(probe.clone());

        let result = supervisor.run().await;
        assert!(result.is_err());
        // All three scripted steps were consumed: connect, drop,
        // reconnect attempt
        assert_eq!(probe.cursor.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_unauthorized_terminates() {
        let probe = ScriptedProbe::new(vec![Ok(()), Err(ScriptedError::Unauthorized)]);
        let supervisor = ConnectionSupervisor::new(probe);

        let result = supervisor.run().await;
        assert!(result.is_err());
        assert_eq!(supervisor.state().await, ConnectionState::Failed);
    }
}
