//! Title and URL validation for new bookmarks.
//!
//! URLs are accepted without a scheme (`google.com`) and normalized to an
//! absolute `https://` form. Only public hostnames with at least two labels
//! and a top-level label of two or more characters are accepted.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::util::normalize_text_option;

static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("Invalid regex"));

static DOTTED_QUAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+$").expect("Invalid regex"));

/// Why a submitted field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ValidationError {
    #[error("Please enter a title")]
    MissingTitle,
    #[error("Please enter a URL, e.g. google.com")]
    MissingUrl,
    #[error("Enter a valid URL, e.g. google.com")]
    InvalidFormat,
    #[error("Please enter a real website URL")]
    NotPublicHost,
}

/// An accepted, fully-qualified `http`/`https` URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input field a validation error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Title,
    Url,
}

/// Validation errors keyed by input field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<ValidationError>,
}

impl FieldErrors {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none()
    }

    pub const fn get(&self, field: Field) -> Option<ValidationError> {
        match field {
            Field::Title => self.title,
            Field::Url => self.url,
        }
    }

    /// Forget the error for one field, e.g. once the user edits it
    pub fn clear(&mut self, field: Field) {
        match field {
            Field::Title => self.title = None,
            Field::Url => self.url = None,
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(2);
        if let Some(error) = self.title {
            parts.push(format!("title: {error}"));
        }
        if let Some(error) = self.url {
            parts.push(format!("url: {error}"));
        }
        f.write_str(&parts.join("; "))
    }
}

/// A title and URL that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub title: String,
    pub url: NormalizedUrl,
}

/// Trim a title, rejecting blank input.
pub fn normalize_title(raw: &str) -> Result<String, ValidationError> {
    normalize_text_option(Some(raw)).ok_or(ValidationError::MissingTitle)
}

/// Normalize raw user input into an accepted URL.
///
/// # Examples
///
/// ```
/// use linkstash_core::validation::{normalize_url, ValidationError};
///
/// assert_eq!(normalize_url("google.com").unwrap().as_str(), "https://google.com");
/// assert_eq!(normalize_url("localhost"), Err(ValidationError::NotPublicHost));
/// ```
pub fn normalize_url(raw: &str) -> Result<NormalizedUrl, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingUrl);
    }

    let has_scheme = SCHEME_PREFIX.is_match(raw);
    let without_scheme = SCHEME_PREFIX.replace(raw, "");
    if is_bare_localhost(&without_scheme) {
        return Err(ValidationError::NotPublicHost);
    }
    if !without_scheme.contains('.') {
        return Err(ValidationError::InvalidFormat);
    }

    let formatted = if has_scheme {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let parsed = Url::parse(&formatted).map_err(|_| ValidationError::InvalidFormat)?;
    let host = parsed.host_str().ok_or(ValidationError::InvalidFormat)?;

    // Private hosts are reported before the label check so dotted quads
    // like 192.168.1.1 are not mistaken for a malformed domain.
    if host == "localhost" || DOTTED_QUAD.is_match(host) {
        return Err(ValidationError::NotPublicHost);
    }

    let labels: Vec<&str> = host.split('.').collect();
    let tld = labels.last().copied().unwrap_or_default();
    if labels.len() < 2 || tld.len() < 2 {
        return Err(ValidationError::InvalidFormat);
    }

    Ok(NormalizedUrl(formatted))
}

/// Validate both fields, collecting every failure.
pub fn validate_submission(title: &str, raw_url: &str) -> Result<ValidSubmission, FieldErrors> {
    let title = normalize_title(title);
    let url = normalize_url(raw_url);

    match (title, url) {
        (Ok(title), Ok(url)) => Ok(ValidSubmission { title, url }),
        (title, url) => Err(FieldErrors {
            title: title.err(),
            url: url.err(),
        }),
    }
}

fn is_bare_localhost(without_scheme: &str) -> bool {
    let host = without_scheme
        .split(['/', ':', '?', '#'])
        .next()
        .unwrap_or_default();
    host.eq_ignore_ascii_case("localhost")
}
