//! Static catalog of the shared servers the team coordinates on.
//!
//! The catalog is fixed at compile time: ids are the short keys used in
//! persisted state and chat commands, display names are what humans see.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a shared server. The string form (`"x86"`, `"arm"`) is the
/// persisted JSON key and the token the transport layer passes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServerId {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "arm")]
    Arm,
}

/// All known servers, in catalog order.
pub const ALL_SERVERS: [ServerId; 2] = [ServerId::X86, ServerId::Arm];

impl ServerId {
    /// Stable short key, used as the persisted JSON key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerId::X86 => "x86",
            ServerId::Arm => "arm",
        }
    }

    /// Human-readable name shown in status output and notifications.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServerId::X86 => "server1",
            ServerId::Arm => "server2",
        }
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for server ids not present in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown server: {0}")]
pub struct UnknownServer(pub String);

impl FromStr for ServerId {
    type Err = UnknownServer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_SERVERS
            .iter()
            .find(|id| id.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownServer(s.to_string()))
    }
}
