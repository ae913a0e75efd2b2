//! Sector Watch Types - Core types for controller presence monitoring
//!
//! Sector Watch keeps a statically configured set of ATC positions
//! (callsigns) under continuous observation against a live network
//! feed, cross-checks the identity behind each online position against
//! the community roster, and fans the resulting transitions out as
//! notifications.
//!
//! ## Key Concepts
//!
//! - **Callsign**: A tracked position identifier, fixed at startup
//! - **Cid**: The canonical network identity behind a connection
//! - **LiveSession**: One feed record observed during a poll cycle
//! - **Roster**: The set of identities permitted to staff positions
//! - **WatchEvent**: A presence transition or rogue-connection alert

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod presence;
pub mod roster;

// Re-export main types
pub use events::WatchEvent;
pub use ids::{Callsign, Cid};
pub use presence::{LiveSession, PresenceState};
pub use roster::Roster;
