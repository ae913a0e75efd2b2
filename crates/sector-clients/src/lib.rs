//! Sector Clients - outbound HTTP transports
//!
//! Concrete clients for the external services Sector Watch talks to:
//!
//! - [`feed::FeedClient`]: the live-session feed (read-only GET)
//! - [`roster::RosterClient`]: the authenticated roster service
//! - [`weather::WeatherClient`]: METAR/TAF pass-through lookups
//! - [`guild::GuildClient`]: guild REST surface (members, roles,
//!   primary notification channel, identity probe)
//! - [`telegram::TelegramClient`]: secondary notification channel
//!
//! Every client bounds its calls with a transport-level timeout so a
//! stuck upstream cannot stall an engine cycle indefinitely. The
//! engine-facing trait impls live next to each client.

#![deny(unsafe_code)]

pub mod error;
pub mod feed;
pub mod guild;
pub mod roster;
pub mod telegram;
pub mod weather;

pub use error::{ClientError, ClientResult};
pub use feed::FeedClient;
pub use guild::GuildClient;
pub use roster::RosterClient;
pub use telegram::TelegramClient;
pub use weather::{ReportKind, WeatherClient};
