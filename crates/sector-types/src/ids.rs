//! Identifier newtypes for tracked positions and network identities

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked position identifier (e.g. `LTBA_TWR`).
///
/// Callsigns are exact-match keys against the live feed. The tracked
/// set is loaded once at startup and never changes at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Callsign(String);

impl Callsign {
    /// Create a callsign, normalizing to uppercase.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_uppercase())
    }

    /// The callsign as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Callsign {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A canonical network identity.
///
/// Upstream services expose identities both as numbers and as strings;
/// everything is coerced to the string form so set membership checks
/// compare like with like.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cid(String);

impl Cid {
    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for Cid {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for Cid {
    fn from(id: &str) -> Self {
        Self(id.trim().to_string())
    }
}

impl From<String> for Cid {
    fn from(id: String) -> Self {
        Self(id.trim().to_string())
    }
}
