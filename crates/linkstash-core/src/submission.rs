//! Submission of new bookmarks.
//!
//! The controller validates input and asks the persistence collaborator to
//! create the record. It never touches the collection view: the new record
//! shows up once the push channel echoes the insert back.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::config::EngineConfig;
use crate::error::Error;
use crate::models::{BookmarkId, OwnerId};
use crate::services::BookmarkPersistence;
use crate::validation::{validate_submission, Field, FieldErrors, NormalizedUrl};

/// A submission the persistence layer accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub id: BookmarkId,
    pub url: NormalizedUrl,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// One or more fields failed validation; nothing was sent
    #[error("Invalid submission: {0}")]
    Invalid(FieldErrors),
    /// The create call failed; not retried
    #[error("Failed to save. Please try again.")]
    Persistence(#[source] Error),
}

/// Form state and submit logic for the "save a new link" flow
pub struct SubmissionController<P> {
    persistence: Arc<P>,
    owner: OwnerId,
    title: String,
    url: String,
    errors: FieldErrors,
    success_signal: Duration,
    success_until: Option<Instant>,
}

impl<P: BookmarkPersistence> SubmissionController<P> {
    pub fn new(persistence: Arc<P>, owner: OwnerId, config: &EngineConfig) -> Self {
        Self {
            persistence,
            owner,
            title: String::new(),
            url: String::new(),
            errors: FieldErrors::default(),
            success_signal: config.success_signal(),
            success_until: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Edit the title input, clearing its error
    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
        self.errors.clear(Field::Title);
    }

    /// Edit the URL input, clearing its error
    pub fn set_url(&mut self, value: impl Into<String>) {
        self.url = value.into();
        self.errors.clear(Field::Url);
    }

    /// Errors from the last submit, minus fields edited since
    pub const fn field_errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Whether the "link saved" signal is still showing
    pub fn success_visible(&self) -> bool {
        self.success_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Submit the current input buffers.
    pub async fn submit_current(&mut self) -> Result<Accepted, SubmitError> {
        let title = self.title.clone();
        let url = self.url.clone();
        self.submit(&title, &url).await
    }

    /// Validate and create a bookmark.
    ///
    /// On success the input buffers are cleared and the success signal is
    /// armed; it lapses on its own after the configured duration.
    pub async fn submit(&mut self, title: &str, raw_url: &str) -> Result<Accepted, SubmitError> {
        self.success_until = None;

        let valid = match validate_submission(title, raw_url) {
            Ok(valid) => valid,
            Err(errors) => {
                self.errors = errors;
                return Err(SubmitError::Invalid(errors));
            }
        };
        self.errors = FieldErrors::default();

        let record = self
            .persistence
            .create(&self.owner, &valid.title, &valid.url)
            .await
            .map_err(|error| {
                tracing::warn!("Failed to save bookmark: {error}");
                SubmitError::Persistence(error)
            })?;

        tracing::debug!("Saved bookmark {}", record.id);
        self.title.clear();
        self.url.clear();
        self.success_until = Some(Instant::now() + self.success_signal);

        Ok(Accepted {
            id: record.id,
            url: valid.url,
        })
    }
}
