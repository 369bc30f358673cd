//! linkstash-core - Core library for LinkStash
//!
//! This crate contains the engine behind a private, live-synced stash of
//! links: URL validation, the locally reconciled collection view, the push
//! channel subscriber, and the submit/delete workflows. Presentation layers
//! drive it; persistence and push delivery are injected collaborators.

pub mod channel;
pub mod config;
pub mod db;
pub mod deletion;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod submission;
pub mod validation;

mod util;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use models::{BookmarkId, BookmarkRecord, OwnerId};
pub use state::ConnectionState;
