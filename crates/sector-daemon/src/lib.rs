//! Sector Watch daemon library
//!
//! Core components for sectord:
//! - Configuration loading and the tracked-callsign list
//! - Platform connection supervision
//! - Operator command surface
//! - Engine wiring and lifecycle

pub mod commands;
pub mod config;
pub mod connection;
pub mod error;

pub use commands::{Command, CommandContext};
pub use config::DaemonConfig;
pub use connection::{ConnectionState, ConnectionSupervisor};
pub use error::{DaemonError, DaemonResult};
