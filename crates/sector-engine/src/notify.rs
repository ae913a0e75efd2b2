//! Multi-channel notification dispatch
//!
//! The same semantic event is rendered once per channel dialect and
//! delivered independently: the primary channel is fire-and-forget
//! (it has its own durability), the secondary channel gets a bounded
//! retry for timeout-class failures only.

use crate::error::ChannelError;
use crate::sources::NotifyChannel;
use sector_types::{PresenceState, WatchEvent};
use std::sync::Arc;
use std::time::Duration;

/// Markup dialect of a notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Shortcode icons, `**bold**`
    Markdown,
    /// Literal emoji, `<b>bold</b>`
    Html,
}

/// Render an event for one dialect.
///
/// The two renderings differ textually but carry identical
/// information: callsign, display name and identity where applicable,
/// and the resulting state or rogue flag.
pub fn render(event: &WatchEvent, dialect: Dialect) -> String {
    match event {
        WatchEvent::StatusChange {
            callsign,
            name,
            cid,
            state,
        } => match state {
            PresenceState::Online => {
                let name = name.as_deref().unwrap_or("Unknown");
                let cid = cid.as_ref().map(|c| c.to_string()).unwrap_or_else(|| "Unknown".into());
                match dialect {
                    Dialect::Markdown => format!(
                        ":globe_with_meridians: **{callsign}** {name} - {cid} is now online."
                    ),
                    Dialect::Html => {
                        format!("\u{1F310} <b>{callsign}</b> {name} - {cid} is now online.")
                    }
                }
            }
            _ => match dialect {
                Dialect::Markdown => format!(":zzz: **{callsign}** is now offline."),
                Dialect::Html => format!("\u{1F4A4} <b>{callsign}</b> is now offline."),
            },
        },
        WatchEvent::RogueAlert { callsign, name, cid } => match dialect {
            Dialect::Markdown => format!(
                ":warning: **ROGUE CONNECTION DETECTED**\n\
                 Controller: {callsign} ({name})\n\
                 CID: {cid}\n\
                 This controller is not on the community roster!"
            ),
            Dialect::Html => format!(
                "\u{26A0} <b>ROGUE CONNECTION DETECTED</b>\n\
                 Controller: {callsign} ({name})\n\
                 CID: {cid}\n\
                 This controller is not on the community roster!"
            ),
        },
    }
}

/// Retry policy for the secondary channel.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Delivers watch events to the primary and secondary channels.
pub struct Dispatcher {
    primary: Arc<dyn NotifyChannel>,
    secondary: Arc<dyn NotifyChannel>,
    retry: RetryPolicy,
}

impl Dispatcher {
    /// New dispatcher with the default retry policy.
    pub fn new(primary: Arc<dyn NotifyChannel>, secondary: Arc<dyn NotifyChannel>) -> Self {
        Self::with_retry(primary, secondary, RetryPolicy::default())
    }

    /// New dispatcher with an explicit retry policy.
    pub fn with_retry(
        primary: Arc<dyn NotifyChannel>,
        secondary: Arc<dyn NotifyChannel>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            primary,
            secondary,
            retry,
        }
    }

    /// Deliver one event to both channels.
    ///
    /// Delivery is best-effort and never transactional: each channel
    /// is an independent side effect, and a failure on one does not
    /// block or abort the other.
    pub async fn dispatch(&self, event: &WatchEvent) {
        let markdown = render(event, Dialect::Markdown);
        tracing::info!(channel = self.primary.name(), message = %markdown, "Dispatching notification");

        if let Err(err) = self.primary.send(&markdown).await {
            tracing::error!(
                channel = self.primary.name(),
                error = %err,
                "Primary notification failed"
            );
        }

        let html = render(event, Dialect::Html);
        self.send_with_retry(&html).await;
    }

    async fn send_with_retry(&self, text: &str) {
        for attempt in 1..=self.retry.max_attempts {
            match self.secondary.send(text).await {
                Ok(()) => return,
                Err(ChannelError::Timeout) => {
                    if attempt < self.retry.max_attempts {
                        tracing::warn!(
                            channel = self.secondary.name(),
                            attempt,
                            max_attempts = self.retry.max_attempts,
                            "Notification timed out, retrying"
                        );
                        tokio::time::sleep(self.retry.delay).await;
                    } else {
                        tracing::error!(
                            channel = self.secondary.name(),
                            "Notification failed after all retries"
                        );
                    }
                }
                Err(err) => {
                    tracing::error!(
                        channel = self.secondary.name(),
                        error = %err,
                        "Notification failed"
                    );
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sector_types::{Callsign, Cid};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    enum Behavior {
        Ok,
        Timeout,
        Reject,
    }

    struct FakeChannel {
        name: &'static str,
        behavior: Behavior,
        attempts: AtomicU32,
        sent: Mutex<Vec<String>>,
    }

    impl FakeChannel {
        fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                name,
                behavior,
                attempts: AtomicU32::new(0),
                sent: Mutex::new(Vec::new()),
            })
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NotifyChannel for FakeChannel {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn send(&self, text: &str) -> Result<(), ChannelError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Ok => {
                    self.sent.lock().unwrap().push(text.to_string());
                    Ok(())
                }
                Behavior::Timeout => Err(ChannelError::Timeout),
                Behavior::Reject => Err(ChannelError::Send("chat not found".into())),
            }
        }
    }

    fn online_event() -> WatchEvent {
        WatchEvent::online(Callsign::new("ABC123"), "John Doe", Cid::from(900001))
    }

    #[test]
    fn test_render_online_both_dialects() {
        let event = online_event();
        assert_eq!(
            render(&event, Dialect::Markdown),
            ":globe_with_meridians: **ABC123** John Doe - 900001 is now online."
        );
        assert_eq!(
            render(&event, Dialect::Html),
            "\u{1F310} <b>ABC123</b> John Doe - 900001 is now online."
        );
    }

    #[test]
    fn test_render_offline_both_dialects() {
        let event = WatchEvent::offline(Callsign::new("ABC123"));
        assert_eq!(
            render(&event, Dialect::Markdown),
            ":zzz: **ABC123** is now offline."
        );
        assert_eq!(
            render(&event, Dialect::Html),
            "\u{1F4A4} <b>ABC123</b> is now offline."
        );
    }

    #[test]
    fn test_render_rogue_carries_identity() {
        let event = WatchEvent::RogueAlert {
            callsign: Callsign::new("ABC123"),
            name: "John Doe".to_string(),
            cid: Cid::from(900001),
        };
        for dialect in [Dialect::Markdown, Dialect::Html] {
            let text = render(&event, dialect);
            assert!(text.contains("ROGUE CONNECTION DETECTED"));
            assert!(text.contains("ABC123"));
            assert!(text.contains("John Doe"));
            assert!(text.contains("900001"));
        }
    }

    #[tokio::test]
    async fn test_both_channels_receive() {
        let primary = FakeChannel::new("guild", Behavior::Ok);
        let secondary = FakeChannel::new("telegram", Behavior::Ok);
        let dispatcher = Dispatcher::new(primary.clone(), secondary.clone());

        dispatcher.dispatch(&online_event()).await;

        assert_eq!(primary.sent.lock().unwrap().len(), 1);
        assert_eq!(secondary.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_primary_failure_does_not_block_secondary() {
        let primary = FakeChannel::new("guild", Behavior::Reject);
        let secondary = FakeChannel::new("telegram", Behavior::Ok);
        let dispatcher = Dispatcher::new(primary.clone(), secondary.clone());

        dispatcher.dispatch(&online_event()).await;

        assert_eq!(primary.attempts(), 1);
        assert_eq!(secondary.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_secondary_timeout_retries_bounded() {
        let primary = FakeChannel::new("guild", Behavior::Ok);
        let secondary = FakeChannel::new("telegram", Behavior::Timeout);
        let dispatcher = Dispatcher::new(primary.clone(), secondary.clone());

        dispatcher.dispatch(&online_event()).await;

        assert_eq!(secondary.attempts(), 3);
        // Primary is never retried
        assert_eq!(primary.attempts(), 1);
    }

    #[tokio::test]
    async fn test_secondary_non_timeout_never_retried() {
        let primary = FakeChannel::new("guild", Behavior::Ok);
        let secondary = FakeChannel::new("telegram", Behavior::Reject);
        let dispatcher = Dispatcher::new(primary.clone(), secondary.clone());

        dispatcher.dispatch(&online_event()).await;

        assert_eq!(secondary.attempts(), 1);
    }
}
