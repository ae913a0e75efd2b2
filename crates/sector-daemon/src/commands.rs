//! Operator command surface
//!
//! Transport-agnostic: the platform integration parses an interaction
//! into a [`Command`] and routes the reply text back to the invoker.
//! Only the configured operator may shut the daemon down.

use sector_clients::{ReportKind, WeatherClient};
use sector_engine::StatusTracker;
use sector_types::Callsign;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Fetch decoded current conditions for a station
    Metar { station: String },
    /// Fetch the decoded terminal forecast for a station
    Taf { station: String },
    /// Query a tracked position's last-known presence
    Status { callsign: String },
    /// Stop the daemon (operator only)
    Shutdown,
}

impl Command {
    /// Parse `"name arg"` command text.
    pub fn parse(input: &str) -> Option<Self> {
        let mut parts = input.split_whitespace();
        let name = parts.next()?.to_lowercase();
        let arg = parts.next();

        match (name.as_str(), arg) {
            ("metar", Some(station)) => Some(Command::Metar {
                station: station.to_uppercase(),
            }),
            ("taf", Some(station)) => Some(Command::Taf {
                station: station.to_uppercase(),
            }),
            ("status", Some(callsign)) => Some(Command::Status {
                callsign: callsign.to_uppercase(),
            }),
            ("shutdown", None) => Some(Command::Shutdown),
            _ => None,
        }
    }
}

/// Shared state the command handlers need.
pub struct CommandContext {
    tracker: Arc<RwLock<StatusTracker>>,
    weather: Arc<WeatherClient>,
    owner_id: u64,
    shutdown: mpsc::Sender<()>,
}

impl CommandContext {
    /// Wire the command surface to the engine state.
    pub fn new(
        tracker: Arc<RwLock<StatusTracker>>,
        weather: Arc<WeatherClient>,
        owner_id: u64,
        shutdown: mpsc::Sender<()>,
    ) -> Self {
        Self {
            tracker,
            weather,
            owner_id,
            shutdown,
        }
    }

    /// Handle one command from `invoker`, returning the reply text.
    ///
    /// A failed upstream fetch reports its reason back to the invoker
    /// rather than surfacing an error anywhere else.
    pub async fn handle(&self, invoker: u64, command: Command) -> String {
        match command {
            Command::Metar { station } => self.weather_reply(&station, ReportKind::Metar).await,
            Command::Taf { station } => self.weather_reply(&station, ReportKind::Taf).await,
            Command::Status { callsign } => {
                let callsign = Callsign::new(callsign);
                let state = self.tracker.read().await.state_of(&callsign);
                format!("Controller {callsign} is currently {state}.")
            }
            Command::Shutdown => {
                if invoker == self.owner_id {
                    tracing::info!(invoker, "Shutdown requested by operator");
                    let _ = self.shutdown.send(()).await;
                    "Shutting down...".to_string()
                } else {
                    tracing::warn!(invoker, "Shutdown refused: not the operator");
                    "Permission denied".to_string()
                }
            }
        }
    }

    async fn weather_reply(&self, station: &str, kind: ReportKind) -> String {
        match self.weather.decoded(station, kind).await {
            Ok(text) => format!("{kind} for **{station}**: {text}"),
            Err(err) => format!("Failed to fetch {kind}: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("metar ltba"),
            Some(Command::Metar {
                station: "LTBA".into()
            })
        );
        assert_eq!(
            Command::parse("TAF LTBA"),
            Some(Command::Taf {
                station: "LTBA".into()
            })
        );
        assert_eq!(
            Command::parse("status abc123"),
            Some(Command::Status {
                callsign: "ABC123".into()
            })
        );
        assert_eq!(Command::parse("shutdown"), Some(Command::Shutdown));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("metar"), None);
        assert_eq!(Command::parse("shutdown now"), None);
        assert_eq!(Command::parse("unknown LTBA"), None);
    }

    fn context(owner_id: u64) -> (CommandContext, mpsc::Receiver<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let tracker = StatusTracker::new([Callsign::new("ABC123")]);
        let context = CommandContext::new(
            Arc::new(RwLock::new(tracker)),
            Arc::new(WeatherClient::new("test-key").unwrap()),
            owner_id,
            shutdown_tx,
        );
        (context, shutdown_rx)
    }

    #[tokio::test]
    async fn test_status_reports_tracker_state() {
        let (context, _rx) = context(1);
        let reply = context
            .handle(
                1,
                Command::Status {
                    callsign: "abc123".into(),
                },
            )
            .await;
        assert_eq!(reply, "Controller ABC123 is currently unknown.");
    }

    #[tokio::test]
    async fn test_shutdown_restricted_to_operator() {
        let (context, mut rx) = context(42);

        let denied = context.handle(7, Command::Shutdown).await;
        assert_eq!(denied, "Permission denied");
        assert!(rx.try_recv().is_err());

        let allowed = context.handle(42, Command::Shutdown).await;
        assert_eq!(allowed, "Shutting down...");
        assert!(rx.try_recv().is_ok());
    }
}
