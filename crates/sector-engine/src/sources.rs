//! Trait seams between the engine and its external collaborators
//!
//! The engine only ever sees these traits; concrete HTTP transports
//! live in `sector-clients` and are wired in by the daemon.

use crate::error::{ChannelError, GatewayError, SourceError};
use async_trait::async_trait;
use sector_types::{Cid, LiveSession};
use std::fmt;

/// Read-only live-session feed.
///
/// Every call performs a live fetch: no caching, no inline retry. A
/// failed cycle is absorbed into the next scheduled one.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current snapshot of live sessions.
    async fn fetch(&self) -> Result<Vec<LiveSession>, SourceError>;
}

/// One successful roster fetch, staff and controllers still separate.
#[derive(Debug, Clone, Default)]
pub struct RosterSnapshot {
    /// Identities of facility staff
    pub staff: Vec<Cid>,
    /// Identities on the controller roster
    pub controllers: Vec<Cid>,
}

/// Authenticated roster service.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Fetch the authorization roster.
    async fn fetch(&self) -> Result<RosterSnapshot, SourceError>;
}

/// Opaque guild member identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberId(String);

impl MemberId {
    /// Wrap a platform member id.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A guild member as the reconciler sees it.
#[derive(Debug, Clone)]
pub struct GuildMember {
    /// Platform member id
    pub id: MemberId,
    /// Server display name, if set
    pub display_name: Option<String>,
    /// Whether the member currently holds the managed role
    pub has_role: bool,
}

/// The guild platform surface the reconciler needs: member listing
/// plus role mutation on the single managed role.
#[async_trait]
pub trait GuildGateway: Send + Sync {
    /// List all members of the managed guild.
    async fn members(&self) -> Result<Vec<GuildMember>, GatewayError>;

    /// Grant the managed role to a member.
    async fn grant_role(&self, member: &MemberId) -> Result<(), GatewayError>;

    /// Revoke the managed role from a member.
    async fn revoke_role(&self, member: &MemberId) -> Result<(), GatewayError>;
}

/// An outbound notification channel.
///
/// Channels are independent side effects: failure on one must never
/// block delivery on another.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Channel name for log lines.
    fn name(&self) -> &'static str;

    /// Deliver one already-rendered message.
    async fn send(&self, text: &str) -> Result<(), ChannelError>;
}
