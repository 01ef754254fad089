//! # xcontext
//!
//! A client for the Twitter/X API v2 built for bots that talk to automated agents.
//! It searches mentions of a handle, posts replies, runs free-form recent searches,
//! and reshapes mention search results into self-contained structured records with
//! their reply and quote context resolved.
//!
//! ## Features
//!
//! - Mention search with an app-only OAuth 2.0 Bearer Token
//! - Replies and general search signed with OAuth 1.0a (HMAC-SHA1)
//! - Typed errors for rate limits (with time until reset), 401 and 403 responses
//! - Structured mentions resolved against the response's `includes` table
//! - A scheduled mention watcher that backs off while rate limited
//! - Structured logging through the `log` facade
//!
//! ## Configuration
//!
//! Both credential sets are required:
//! - `TWITTER_API_KEY`, `TWITTER_API_KEY_SECRET`, `TWITTER_ACCESS_TOKEN`,
//!   `TWITTER_ACCESS_TOKEN_SECRET`: OAuth 1.0a credentials (replies, general search)
//! - `TWITTER_BEARER_TOKEN`: Bearer Token (mention search)

pub mod config;
pub mod cronjob;
pub mod error;
pub mod oauth;
pub mod twitter;

// Re-export commonly used types and functions
pub use config::{OAuthCredentials, TwitterConfig, WatcherConfig};
pub use cronjob::{run_mention_cronjob, start_mention_cronjob, MentionWatcher};
pub use error::{EntityKind, TwitterError, TwitterResult};
pub use oauth::{build_bearer_auth_header, build_oauth1_header};
pub use twitter::{
    normalize_mentions, ReplyResponse, SearchResponse, StructuredMention, Transport,
    TwitterClient,
};
