//! Sector Engine - presence reconciliation and notification engine
//!
//! The engine runs a small set of independently paced loops over
//! shared in-memory state:
//!
//! - **Status tracker**: turns raw feed snapshots into presence
//!   transition events, one writer, per-callsign state machine
//! - **Roster cache**: refreshes the authorization roster on a coarse
//!   cadence, keeping stale data over empty data on failure
//! - **Membership reconciler**: grants/revokes the online-controller
//!   role on guild members whose display name encodes an identity
//! - **Notification dispatcher**: renders events per channel dialect
//!   and delivers them independently, with bounded retry on the
//!   secondary channel
//! - **Scheduler**: owns the loops and the single-writer discipline
//!
//! Concrete transports stay behind the trait seams in [`sources`], so
//! the engine itself never touches the network.

#![deny(unsafe_code)]

pub mod error;
pub mod notify;
pub mod reconciler;
pub mod roster;
pub mod scheduler;
pub mod sources;
pub mod tracker;

// Re-export main types
pub use error::{ChannelError, EngineError, EngineResult, GatewayError, SourceError};
pub use notify::{Dialect, Dispatcher, RetryPolicy};
pub use reconciler::{extract_cid, MembershipReconciler, ReconcileOutcome};
pub use roster::RosterCache;
pub use scheduler::{Engine, EngineConfig};
pub use sources::{FeedSource, GuildGateway, GuildMember, MemberId, NotifyChannel, RosterSnapshot, RosterSource};
pub use tracker::StatusTracker;
