//! Shared connection state types.

use serde::{Deserialize, Serialize};

/// Lifecycle of the push-channel subscription.
///
/// Reflects whether live updates are flowing, not whether the collection
/// view is correct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Live,
    Error,
}

impl ConnectionState {
    /// Short label suitable for a status badge.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Live => "Live",
            Self::Error => "Error",
        }
    }
}
