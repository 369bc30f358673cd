//! Bookmark model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new unique ID using UUID v7
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Get the string representation of this ID
            #[must_use]
            pub fn as_str(&self) -> String {
                self.0.to_string()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }
    };
}

uuid_id!(
    /// Server-assigned bookmark identifier, globally unique
    BookmarkId
);

uuid_id!(
    /// Identifier of the user who owns a bookmark
    OwnerId
);

/// A saved link as stored by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    /// Unique identifier
    pub id: BookmarkId,
    /// Owner of the record, never changes
    #[serde(rename = "user_id")]
    pub owner_id: OwnerId,
    /// Display title, trimmed and non-empty
    pub title: String,
    /// Normalized absolute `http`/`https` URL
    pub url: String,
    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,
}

impl BookmarkRecord {
    /// Build a record with a fresh id, stamped with the current time
    #[must_use]
    pub fn new(owner_id: OwnerId, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: BookmarkId::new(),
            owner_id,
            title: title.into(),
            url: url.into(),
            created_at: Utc::now(),
        }
    }
}
