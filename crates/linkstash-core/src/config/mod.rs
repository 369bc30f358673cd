//! Engine configuration.
//!
//! Provides `EngineConfig`, the tunables shared by the store, the channel
//! subscriber and the submission controller. Every field has a default so
//! an empty JSON object is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

const DEFAULT_TOMBSTONE_TTL_MS: u64 = 60_000;
const DEFAULT_TOMBSTONE_CAPACITY: usize = 512;
const DEFAULT_SUCCESS_SIGNAL_MS: u64 = 3_000;
const DEFAULT_CHANNEL_BUFFER: usize = 64;
const DEFAULT_TOPIC_PREFIX: &str = "bookmarks";

/// Runtime tunables for the collection engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    /// How long a deleted id keeps suppressing late inserts
    pub tombstone_ttl_ms: u64,
    /// Maximum number of tombstones kept at once; oldest are evicted first
    pub tombstone_capacity: usize,
    /// How long the "link saved" signal stays visible after a submit
    pub success_signal_ms: u64,
    /// Capacity of the per-subscription message buffer
    pub channel_buffer: usize,
    /// Prefix of the per-owner subscription key (`<prefix>:<owner>`)
    pub topic_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tombstone_ttl_ms: DEFAULT_TOMBSTONE_TTL_MS,
            tombstone_capacity: DEFAULT_TOMBSTONE_CAPACITY,
            success_signal_ms: DEFAULT_SUCCESS_SIGNAL_MS,
            channel_buffer: DEFAULT_CHANNEL_BUFFER,
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a configuration from a JSON payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(payload)
            .map_err(|error| Error::Config(format!("invalid engine config JSON: {error}")))?;
        config.validated()
    }

    /// Check value ranges, trimming the topic prefix.
    pub fn validated(mut self) -> Result<Self> {
        if self.tombstone_ttl_ms == 0 {
            return Err(Error::Config("tombstone_ttl_ms must be positive".into()));
        }
        if self.tombstone_capacity == 0 {
            return Err(Error::Config("tombstone_capacity must be positive".into()));
        }
        if self.channel_buffer == 0 {
            return Err(Error::Config("channel_buffer must be positive".into()));
        }
        self.topic_prefix = normalize_text_option(Some(&self.topic_prefix))
            .ok_or_else(|| Error::Config("topic_prefix must not be empty".into()))?;
        Ok(self)
    }

    pub const fn tombstone_ttl(&self) -> Duration {
        Duration::from_millis(self.tombstone_ttl_ms)
    }

    pub const fn success_signal(&self) -> Duration {
        Duration::from_millis(self.success_signal_ms)
    }
}
