//! Error types for the Twitter/X client.
//!
//! The first four variants are the failures callers are expected to branch on.
//! The remaining ones cover transport, decoding, signing and setup problems.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The kind of entity that failed to resolve against a response's `includes` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Tweet,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::User => write!(f, "User"),
            EntityKind::Tweet => write!(f, "Tweet"),
        }
    }
}

/// Errors produced by the Twitter/X client.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// HTTP 429. `remaining_seconds` is `reset - now` and may be zero or negative
    /// when the reset instant has already passed.
    #[error(
        "Rate limit exceeded. Please wait about {} minutes ({} seconds).",
        wait_minutes(.remaining_seconds),
        .remaining_seconds
    )]
    RateLimitExceeded { remaining_seconds: i64 },

    /// HTTP 401. `body` is the serialized response body.
    #[error("Authentication error: {body}")]
    AuthenticationFailure { body: String },

    /// HTTP 403. `body` is the serialized response body.
    #[error("Authorization error: {body}")]
    AuthorizationFailure { body: String },

    /// A cross-reference could not be resolved while building structured mentions.
    #[error("{kind} not found: {id}")]
    EntityNotFound { kind: EntityKind, id: String },

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// A response body could not be decoded into the expected shape.
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// The OAuth 1.0a signature could not be computed.
    #[error("request signing failed: {0}")]
    Signing(String),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias.
pub type TwitterResult<T> = Result<T, TwitterError>;

impl TwitterError {
    /// How long the caller should wait before retrying, for rate-limit errors.
    ///
    /// Returns `Some(Duration::ZERO)` when the reset instant has already passed and
    /// `None` for every other kind of error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            TwitterError::RateLimitExceeded { remaining_seconds } => {
                Some(Duration::from_secs((*remaining_seconds).max(0) as u64))
            }
            _ => None,
        }
    }

    /// Whether the error is caused by credentials (401 or 403).
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            TwitterError::AuthenticationFailure { .. } | TwitterError::AuthorizationFailure { .. }
        )
    }
}

impl From<reqwest::Error> for TwitterError {
    fn from(e: reqwest::Error) -> Self {
        TwitterError::Transport(e.to_string())
    }
}

fn wait_minutes(seconds: &i64) -> i64 {
    ceil_minutes(*seconds)
}

/// Whole minutes, rounded up.
pub(crate) fn ceil_minutes(seconds: i64) -> i64 {
    let minutes = seconds.div_euclid(60);
    if seconds.rem_euclid(60) > 0 {
        minutes + 1
    } else {
        minutes
    }
}
